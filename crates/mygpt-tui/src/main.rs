use anyhow::Result;
use clap::Parser;
use mygpt_core::Config;
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod picker;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui, TICK_RATE};

#[derive(Parser)]
#[command(name = "mygpt")]
#[command(about = "Chat with a local Ollama model, with PDF attachments", version)]
struct Cli {
    /// Model to chat with (defaults to the last one used)
    #[arg(short, long)]
    model: Option<String>,
    /// Ollama server URL (overrides OLLAMA_HOST and the config file)
    #[arg(long)]
    ollama_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init()?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load config, using defaults");
        Config::new()
    });
    let ollama_url = cli
        .ollama_url
        .unwrap_or_else(|| config.resolved_ollama_url());

    let mut app = App::new(config, &ollama_url, cli.model);
    app.refresh_models().await;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;
    info!("exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event).await?,
            Some(update) = app.session.next_update() => app.apply_session_update(update),
            else => break,
        }

        app.sync_chat();
    }

    Ok(())
}
