//! File logging.
//!
//! The terminal belongs to the UI while the app runs, so log output goes to
//! `<data dir>/mygpt/logs/mygpt.log` through a non-blocking writer. The
//! returned guard must be kept alive until exit or buffered lines are lost.
//!
//! Verbosity follows `RUST_LOG`, defaulting to `info` with HTTP internals
//! quieted.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE: &str = "mygpt.log";

pub fn init() -> Result<WorkerGuard> {
    let log_dir = log_dir();
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        log_path = %log_path().display(),
        version = env!("CARGO_PKG_VERSION"),
        "logging initialized"
    );

    Ok(guard)
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mygpt").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("mygpt-logs"))
}

pub fn log_path() -> PathBuf {
    log_dir().join(LOG_FILE)
}
