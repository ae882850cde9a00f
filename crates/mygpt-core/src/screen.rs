//! Chat screen logic, independent of how it is drawn.
//!
//! The screen keeps no conversation state of its own. Every enable/disable
//! decision is a fresh read of the collaborator's flags, and the only local
//! state is the composer, a transient notice and what was seen at the last
//! sync (used to issue scroll commands).

use crate::composer::{AttachOutcome, Composer, FilePick};
use crate::pdf::TextExtractor;
use crate::state::ChatState;
use tracing::{debug, warn};

/// Scroll request for the message list.
///
/// `ToIndex(n)` with `n` equal to the message count means "just past the last
/// message", i.e. the bottom of the list. Issuing the same command twice is
/// harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCommand {
    ToIndex(usize),
}

#[derive(Debug, Default)]
pub struct ChatScreen {
    composer: Composer,
    notice: Option<String>,
    seen_version: Option<u64>,
    seen_len: usize,
    pending_scroll: Option<ScrollCommand>,
}

impl ChatScreen {
    pub const TITLE: &'static str = "MyGPT";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Mutable access for text editing; any edit dismisses the notice
    pub fn edit(&mut self) -> &mut Composer {
        self.notice = None;
        &mut self.composer
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Text for the status line: a local notice wins over the report
    pub fn status_line<'a, S: ChatState + ?Sized>(&'a self, state: &'a S) -> &'a str {
        self.notice.as_deref().unwrap_or_else(|| state.report())
    }

    /// Compare the collaborator's sequence with what was seen last time and
    /// queue a scroll to the bottom when its length changed. Nothing is
    /// inspected while the collaborator's version stays the same.
    pub fn sync<S: ChatState + ?Sized>(&mut self, state: &S) -> Option<ScrollCommand> {
        let version = state.version();
        if self.seen_version == Some(version) {
            return self.pending_scroll;
        }
        self.seen_version = Some(version);

        let len = state.messages().len();
        if len != self.seen_len {
            debug!(from = self.seen_len, to = len, "message count changed");
            self.seen_len = len;
            self.pending_scroll = Some(ScrollCommand::ToIndex(len));
        }
        self.pending_scroll
    }

    /// Take the queued scroll command, if any
    pub fn take_scroll(&mut self) -> Option<ScrollCommand> {
        self.pending_scroll.take()
    }

    pub fn can_send<S: ChatState + ?Sized>(&self, state: &S) -> bool {
        self.composer.can_send(state)
    }

    pub fn back_enabled<S: ChatState + ?Sized>(&self, state: &S) -> bool {
        state.interruptable()
    }

    pub fn reset_enabled<S: ChatState + ?Sized>(&self, state: &S) -> bool {
        state.interruptable()
    }

    pub fn on_send<S: ChatState + ?Sized>(&mut self, state: &mut S) -> bool {
        let sent = self.composer.on_send(state);
        if sent {
            self.notice = None;
        }
        sent
    }

    /// Returns whether leaving the screen is allowed right now
    pub fn on_back<S: ChatState + ?Sized>(&mut self, state: &S) -> bool {
        if !self.back_enabled(state) {
            debug!("back ignored while not interruptable");
            return false;
        }
        self.notice = None;
        true
    }

    pub fn on_reset<S: ChatState + ?Sized>(&mut self, state: &mut S) -> bool {
        if !self.reset_enabled(&*state) {
            debug!("reset ignored while not interruptable");
            return false;
        }
        self.notice = None;
        state.request_reset_chat();
        true
    }

    /// Feed the file selection result through the composer. Extraction
    /// failures end up on the status line instead of propagating.
    pub fn on_attach<S, E>(&mut self, pick: FilePick, extractor: &E, state: &mut S) -> AttachOutcome
    where
        S: ChatState + ?Sized,
        E: TextExtractor + ?Sized,
    {
        match self.composer.on_attach_file(pick, extractor, state) {
            Ok(AttachOutcome::Drafted) => {
                self.notice = Some("Document loaded. Press Enter to send once the model is ready".to_string());
                AttachOutcome::Drafted
            }
            Ok(outcome) => {
                if outcome == AttachOutcome::Forwarded {
                    self.notice = None;
                }
                outcome
            }
            Err(err) => {
                warn!(error = %err, "could not attach file");
                self.notice = Some(format!("Could not read file: {err}"));
                AttachOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageData, MessageId, MessageRole};
    use crate::test_support::{FixedExtractor, RecordingState};

    #[test]
    fn growth_issues_scroll_to_newest() {
        let mut state = RecordingState::ready();
        let mut screen = ChatScreen::new();

        assert_eq!(screen.sync(&state), None);

        state.push(MessageRole::User, "Hi");
        state.push(MessageRole::Bot, "Hello");
        assert_eq!(screen.sync(&state), Some(ScrollCommand::ToIndex(2)));

        // Still pending until taken, and re-syncing is idempotent
        assert_eq!(screen.sync(&state), Some(ScrollCommand::ToIndex(2)));
        assert_eq!(screen.take_scroll(), Some(ScrollCommand::ToIndex(2)));
        assert_eq!(screen.sync(&state), None);
    }

    #[test]
    fn sync_only_looks_at_messages_after_version_change() {
        let mut state = RecordingState::ready();
        let mut screen = ChatScreen::new();
        assert_eq!(screen.sync(&state), None);

        // Same version: the sequence is not re-read
        state
            .messages
            .push(MessageData::new(MessageId::new(1), MessageRole::User, "Hi"));
        assert_eq!(screen.sync(&state), None);

        state.version += 1;
        assert_eq!(screen.sync(&state), Some(ScrollCommand::ToIndex(1)));
    }

    #[test]
    fn version_change_without_growth_does_not_scroll() {
        let mut state = RecordingState::ready();
        let mut screen = ChatScreen::new();
        state.push(MessageRole::User, "Hi");
        screen.sync(&state);
        screen.take_scroll();

        state.report = "Generating...".to_string();
        state.version += 1;

        assert_eq!(screen.sync(&state), None);
    }

    #[test]
    fn later_scroll_supersedes_earlier() {
        let mut state = RecordingState::ready();
        let mut screen = ChatScreen::new();

        state.push(MessageRole::User, "one");
        screen.sync(&state);
        state.push(MessageRole::Bot, "two");
        screen.sync(&state);

        assert_eq!(screen.take_scroll(), Some(ScrollCommand::ToIndex(2)));
        assert_eq!(screen.take_scroll(), None);
    }

    #[test]
    fn send_scenario() {
        let mut state = RecordingState::ready();
        let mut screen = ChatScreen::new();
        screen.edit().on_text_changed("Hello");

        assert!(screen.can_send(&state));
        assert!(screen.on_send(&mut state));

        assert_eq!(state.generate_requests, vec!["Hello"]);
        assert_eq!(screen.composer().draft(), "");
    }

    #[test]
    fn back_and_reset_disabled_while_not_interruptable() {
        let mut state = RecordingState::busy();
        let mut screen = ChatScreen::new();

        assert!(!screen.back_enabled(&state));
        assert!(!screen.on_back(&state));
        assert!(!screen.on_reset(&mut state));
        assert_eq!(state.reset_requests, 0);

        state.interruptable = true;
        assert!(screen.on_back(&state));
        assert!(screen.on_reset(&mut state));
        assert_eq!(state.reset_requests, 1);
    }

    #[test]
    fn extraction_failure_becomes_notice() {
        let mut state = RecordingState::ready();
        state.report = "Ready to chat".to_string();
        let mut screen = ChatScreen::new();
        screen.edit().on_text_changed("draft");

        let outcome = screen.on_attach(
            FilePick::Picked("broken.pdf".into()),
            &FixedExtractor(Err("bad xref")),
            &mut state,
        );

        assert_eq!(outcome, AttachOutcome::Failed);
        assert!(screen.status_line(&state).contains("bad xref"));
        assert_eq!(screen.composer().draft(), "draft");
        assert!(state.generate_requests.is_empty());

        // Editing dismisses the notice and the report shows again
        screen.edit().insert_char('!');
        assert_eq!(screen.status_line(&state), "Ready to chat");
    }

    #[test]
    fn attach_scenario_forwards_document() {
        let mut state = RecordingState::ready();
        let mut screen = ChatScreen::new();

        let outcome = screen.on_attach(
            FilePick::Picked("doc.pdf".into()),
            &FixedExtractor(Ok("Doc body")),
            &mut state,
        );

        assert_eq!(outcome, AttachOutcome::Forwarded);
        assert_eq!(screen.composer().draft(), "Doc body");
        assert_eq!(state.generate_requests, vec!["Doc body"]);
        assert_eq!(screen.notice(), None);
    }

    #[test]
    fn attach_while_busy_leaves_hint() {
        let mut state = RecordingState::busy();
        let mut screen = ChatScreen::new();

        let outcome = screen.on_attach(
            FilePick::Picked("doc.pdf".into()),
            &FixedExtractor(Ok("Doc body")),
            &mut state,
        );

        assert_eq!(outcome, AttachOutcome::Drafted);
        assert!(screen.notice().is_some());
        assert!(state.generate_requests.is_empty());
    }
}
