//! A conversation driven by a [`GenerationBackend`].
//!
//! `ChatSession` is the collaborator the chat screen talks to. Requests are
//! answered asynchronously: generation runs in a spawned task that reports
//! back through a channel, and the owner of the session applies those updates
//! on its own task (see [`ChatSession::next_update`] and
//! [`ChatSession::apply`]). Observable state therefore only changes where the
//! owner can see it happen.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ai::{FragmentSink, GenerationBackend};
use crate::message::{MessageData, MessageId, MessageRole};
use crate::state::ChatState;

pub const REPORT_GENERATING: &str = "Generating...";
pub const REPORT_RESETTING: &str = "Resetting chat...";
pub const REPORT_RESET_DONE: &str = "Chat reset";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Generating,
    Resetting,
    Failed,
}

/// Progress reported back to the session. Every update carries the serial of
/// the request it belongs to; updates for anything but the current request
/// are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Fragment { serial: u64, text: String },
    Finished { serial: u64 },
    Failed { serial: u64, error: String },
    ResetDone { serial: u64 },
}

impl SessionUpdate {
    fn serial(&self) -> u64 {
        match self {
            SessionUpdate::Fragment { serial, .. }
            | SessionUpdate::Finished { serial }
            | SessionUpdate::Failed { serial, .. }
            | SessionUpdate::ResetDone { serial } => *serial,
        }
    }
}

pub struct ChatSession<B> {
    backend: Arc<B>,
    model: String,
    messages: Vec<MessageData>,
    report: String,
    state: SessionState,
    version: u64,
    next_id: u64,
    serial: u64,
    task: Option<JoinHandle<()>>,
    updates_tx: mpsc::UnboundedSender<SessionUpdate>,
    updates_rx: mpsc::UnboundedReceiver<SessionUpdate>,
}

impl<B: GenerationBackend> ChatSession<B> {
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            backend: Arc::new(backend),
            model: model.into(),
            messages: Vec::new(),
            report: String::new(),
            state: SessionState::Ready,
            version: 0,
            next_id: 1,
            serial: 0,
            task: None,
            updates_tx,
            updates_rx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Use `model` for subsequent requests
    pub fn set_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        if model != self.model {
            info!(from = %self.model, to = %model, "switching model");
            self.model = model;
            self.touch();
        }
    }

    /// Wait for the next update from in-flight work
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        self.updates_rx.recv().await
    }

    /// Apply every update that is already queued, without waiting
    pub fn drain_updates(&mut self) {
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply(update);
        }
    }

    pub fn apply(&mut self, update: SessionUpdate) {
        if update.serial() != self.serial {
            debug!(serial = update.serial(), current = self.serial, "dropping stale update");
            return;
        }

        match update {
            SessionUpdate::Fragment { text, .. } => {
                if self.state != SessionState::Generating {
                    return;
                }
                if let Some(last) = self.messages.last_mut() {
                    if last.role() == MessageRole::Bot {
                        *last = last.appended(&text);
                        self.touch();
                    }
                }
            }
            SessionUpdate::Finished { .. } => {
                if self.state == SessionState::Generating {
                    info!("generation finished");
                    self.task = None;
                    self.state = SessionState::Ready;
                    self.report.clear();
                    self.touch();
                }
            }
            SessionUpdate::Failed { error, .. } => {
                if self.state == SessionState::Generating {
                    warn!(%error, "generation failed");
                    self.task = None;
                    self.state = SessionState::Failed;
                    self.report = format!("Generation failed: {error}");
                    self.touch();
                }
            }
            SessionUpdate::ResetDone { .. } => {
                if self.state == SessionState::Resetting {
                    info!("chat reset");
                    self.messages.clear();
                    self.state = SessionState::Ready;
                    self.report = REPORT_RESET_DONE.to_string();
                    self.touch();
                }
            }
        }
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    fn alloc_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<B: GenerationBackend> ChatState for ChatSession<B> {
    fn messages(&self) -> &[MessageData] {
        &self.messages
    }

    fn report(&self) -> &str {
        &self.report
    }

    fn chatable(&self) -> bool {
        self.state == SessionState::Ready
    }

    fn interruptable(&self) -> bool {
        matches!(
            self.state,
            SessionState::Ready | SessionState::Generating | SessionState::Failed
        )
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn request_generate(&mut self, text: &str) {
        if !self.chatable() {
            warn!(state = ?self.state, "generate requested while not chatable");
            return;
        }

        let user_id = self.alloc_id();
        self.messages
            .push(MessageData::new(user_id, MessageRole::User, text));
        // Everything up to and including the new user message
        let history = self.messages.clone();

        let bot_id = self.alloc_id();
        self.messages.push(MessageData::new(bot_id, MessageRole::Bot, ""));

        self.serial += 1;
        self.state = SessionState::Generating;
        self.report = REPORT_GENERATING.to_string();
        self.touch();

        let serial = self.serial;
        let backend = Arc::clone(&self.backend);
        let model = self.model.clone();
        let tx = self.updates_tx.clone();

        info!(serial, model = %model, chars = text.chars().count(), "starting generation");

        self.task = Some(tokio::spawn(async move {
            let sink = FragmentSink::new(serial, tx.clone());
            let update = match backend.generate(&model, &history, &sink).await {
                Ok(()) => SessionUpdate::Finished { serial },
                Err(e) => SessionUpdate::Failed {
                    serial,
                    error: e.to_string(),
                },
            };
            let _ = tx.send(update);
        }));
    }

    fn request_reset_chat(&mut self) {
        if !self.interruptable() {
            warn!(state = ?self.state, "reset requested while not interruptable");
            return;
        }

        self.abort_task();
        self.serial += 1;
        self.state = SessionState::Resetting;
        self.report = REPORT_RESETTING.to_string();
        self.touch();

        let _ = self.updates_tx.send(SessionUpdate::ResetDone {
            serial: self.serial,
        });
    }
}

impl<B> Drop for ChatSession<B> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
