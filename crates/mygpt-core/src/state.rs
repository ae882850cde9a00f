//! The contract between a chat screen and whatever owns the conversation.
//!
//! The screen never mutates conversation state directly. It reads the
//! observable fields, polls the two capability flags before acting, and calls
//! the two request entry points. Results of a request show up later as changes
//! to `messages` and `report`.

use crate::message::MessageData;

pub trait ChatState {
    /// Conversation in insertion order
    fn messages(&self) -> &[MessageData];

    /// Free-form status text, shown verbatim
    fn report(&self) -> &str;

    /// A new generation request may be submitted
    fn chatable(&self) -> bool;

    /// It is safe to reset or navigate away
    fn interruptable(&self) -> bool;

    /// Bumped on every observable change
    fn version(&self) -> u64;

    fn request_generate(&mut self, text: &str);

    fn request_reset_chat(&mut self);
}
