use crate::error::ExtractError;
use crate::message::{MessageData, MessageId, MessageRole};
use crate::pdf::TextExtractor;
use crate::state::ChatState;
use std::path::Path;

/// A `ChatState` that records requests and lets tests flip its flags
#[derive(Debug, Default)]
pub struct RecordingState {
    pub messages: Vec<MessageData>,
    pub report: String,
    pub chatable: bool,
    pub interruptable: bool,
    pub version: u64,
    pub generate_requests: Vec<String>,
    pub reset_requests: usize,
}

impl RecordingState {
    pub fn ready() -> Self {
        Self {
            chatable: true,
            interruptable: true,
            ..Self::default()
        }
    }

    pub fn busy() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: MessageRole, text: &str) {
        let id = MessageId::new(self.messages.len() as u64 + 1);
        self.messages.push(MessageData::new(id, role, text));
        self.version += 1;
    }
}

impl ChatState for RecordingState {
    fn messages(&self) -> &[MessageData] {
        &self.messages
    }

    fn report(&self) -> &str {
        &self.report
    }

    fn chatable(&self) -> bool {
        self.chatable
    }

    fn interruptable(&self) -> bool {
        self.interruptable
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn request_generate(&mut self, text: &str) {
        self.generate_requests.push(text.to_string());
    }

    fn request_reset_chat(&mut self) {
        self.reset_requests += 1;
    }
}

/// Extractor returning a fixed result regardless of the path
pub struct FixedExtractor(pub Result<&'static str, &'static str>);

impl TextExtractor for FixedExtractor {
    fn extract(&self, _path: &Path) -> Result<String, ExtractError> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(reason) => Err(ExtractError::Parse(reason.to_string())),
        }
    }
}
