pub mod ai;
pub mod composer;
pub mod config;
pub mod error;
pub mod message;
pub mod pdf;
pub mod render;
pub mod screen;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use ai::{FragmentSink, GenerationBackend, OllamaClient};
pub use composer::{AttachOutcome, Composer, FilePick};
pub use config::Config;
pub use error::{BackendError, ExtractError};
pub use message::{MessageData, MessageId, MessageRole};
pub use pdf::{PdfTextExtractor, TextExtractor};
pub use render::{MessageRow, RowAlignment};
pub use screen::{ChatScreen, ScrollCommand};
pub use session::{ChatSession, SessionState, SessionUpdate};
pub use state::ChatState;
