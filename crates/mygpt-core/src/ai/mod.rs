//! Generation backends
//!
//! A backend turns a conversation history into a reply, streaming text
//! fragments into a [`FragmentSink`] as they arrive.

pub mod ollama;

pub use ollama::OllamaClient;

use crate::error::BackendError;
use crate::message::MessageData;
use crate::session::SessionUpdate;
use std::future::Future;
use tokio::sync::mpsc;

pub trait GenerationBackend: Send + Sync + 'static {
    /// Generate the next bot reply for `history` (oldest first, ending with
    /// the user's message). Resolves once the reply is complete.
    fn generate(
        &self,
        model: &str,
        history: &[MessageData],
        sink: &FragmentSink,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Where a backend delivers reply fragments for one request
#[derive(Debug, Clone)]
pub struct FragmentSink {
    serial: u64,
    tx: mpsc::UnboundedSender<SessionUpdate>,
}

impl FragmentSink {
    pub(crate) fn new(serial: u64, tx: mpsc::UnboundedSender<SessionUpdate>) -> Self {
        Self { serial, tx }
    }

    /// Deliver a fragment. Returns false once nobody is listening anymore,
    /// at which point the backend should stop.
    pub fn push(&self, text: impl Into<String>) -> bool {
        self.tx
            .send(SessionUpdate::Fragment {
                serial: self.serial,
                text: text.into(),
            })
            .is_ok()
    }
}
