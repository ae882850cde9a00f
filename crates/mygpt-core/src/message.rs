//! Chat message values
//!
//! Messages are immutable once created. A streaming reply is represented by
//! replacing the message with a new value that keeps the same id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message, unique within a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    User,
    Bot,
}

/// One entry of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    id: MessageId,
    role: MessageRole,
    text: String,
}

impl MessageData {
    pub fn new(id: MessageId, role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// A copy of this message with `fragment` appended to its text
    pub fn appended(&self, fragment: &str) -> Self {
        let mut text = String::with_capacity(self.text.len() + fragment.len());
        text.push_str(&self.text);
        text.push_str(fragment);
        Self::new(self.id, self.role, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_keeps_identity() {
        let msg = MessageData::new(MessageId::new(7), MessageRole::Bot, "Hel");
        let next = msg.appended("lo");

        assert_eq!(next.id(), msg.id());
        assert_eq!(next.role(), MessageRole::Bot);
        assert_eq!(next.text(), "Hello");
        // Original value is untouched
        assert_eq!(msg.text(), "Hel");
    }

    #[test]
    fn id_display() {
        assert_eq!(MessageId::new(42).to_string(), "#42");
    }
}
