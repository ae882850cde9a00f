//! The input row under the message list: a draft plus the "attach file" and
//! "send" actions.
//!
//! The composer owns nothing but the draft. Both actions read the
//! collaborator's flags at the moment they are invoked and make at most one
//! request call.

use crate::error::ExtractError;
use crate::pdf::TextExtractor;
use crate::state::ChatState;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of the file selection flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePick {
    Cancelled,
    Picked(PathBuf),
}

/// What an attach action ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Selection was cancelled, nothing changed
    Cancelled,
    /// Text became the draft and was sent for generation
    Forwarded,
    /// Text became the draft but the collaborator was busy
    Drafted,
    /// Extraction failed, nothing changed
    Failed,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
    // cursor position in chars, not bytes
    cursor: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the draft verbatim and put the cursor at its end
    pub fn on_text_changed(&mut self, new_text: impl Into<String>) {
        self.draft = new_text.into();
        self.cursor = self.draft.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert_str(byte_pos, s);
        self.cursor += s.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }

    pub fn can_send<S: ChatState + ?Sized>(&self, state: &S) -> bool {
        !self.draft.is_empty() && state.chatable()
    }

    /// Forward the draft for generation and clear it.
    ///
    /// Does nothing (and keeps the draft) unless [`Composer::can_send`] holds.
    /// Returns whether the request was made.
    pub fn on_send<S: ChatState + ?Sized>(&mut self, state: &mut S) -> bool {
        if !self.can_send(&*state) {
            debug!(draft_len = self.draft.len(), chatable = state.chatable(), "send ignored");
            return false;
        }

        state.request_generate(&self.draft);
        self.draft.clear();
        self.cursor = 0;
        true
    }

    /// Handle the result of the file selection flow.
    ///
    /// Picked files are run through `extractor`; the text overwrites the draft
    /// and is forwarded straight away when the collaborator is chatable. The
    /// draft is left in place after forwarding. On any error the draft and the
    /// collaborator are untouched.
    pub fn on_attach_file<S, E>(
        &mut self,
        pick: FilePick,
        extractor: &E,
        state: &mut S,
    ) -> Result<AttachOutcome, ExtractError>
    where
        S: ChatState + ?Sized,
        E: TextExtractor + ?Sized,
    {
        let path = match pick {
            FilePick::Cancelled => return Ok(AttachOutcome::Cancelled),
            FilePick::Picked(path) => path,
        };

        let text = extractor.extract(&path)?;
        info!(path = %path.display(), chars = text.chars().count(), "attached document");

        self.on_text_changed(text);

        if state.chatable() {
            state.request_generate(&self.draft);
            Ok(AttachOutcome::Forwarded)
        } else {
            Ok(AttachOutcome::Drafted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedExtractor, RecordingState};

    fn composer_with(text: &str) -> Composer {
        let mut composer = Composer::new();
        composer.on_text_changed(text);
        composer
    }

    #[test]
    fn send_forwards_draft_and_clears_it() {
        let mut state = RecordingState::ready();
        let mut composer = composer_with("Hello");

        assert!(composer.on_send(&mut state));

        assert_eq!(state.generate_requests, vec!["Hello"]);
        assert_eq!(composer.draft(), "");
        assert_eq!(composer.cursor(), 0);
    }

    #[test]
    fn send_is_verbatim() {
        let mut state = RecordingState::ready();
        let mut composer = composer_with("  padded\ttext  ");

        composer.on_send(&mut state);

        assert_eq!(state.generate_requests, vec!["  padded\ttext  "]);
    }

    #[test]
    fn send_while_not_chatable_keeps_draft() {
        let mut state = RecordingState::busy();
        let mut composer = composer_with("Hello");

        assert!(!composer.can_send(&state));
        assert!(!composer.on_send(&mut state));

        assert!(state.generate_requests.is_empty());
        assert_eq!(composer.draft(), "Hello");
    }

    #[test]
    fn empty_draft_cannot_be_sent() {
        let mut state = RecordingState::ready();
        let mut composer = Composer::new();

        assert!(!composer.on_send(&mut state));
        assert!(state.generate_requests.is_empty());
    }

    #[test]
    fn cancelled_pick_changes_nothing() {
        let mut state = RecordingState::ready();
        let mut composer = composer_with("keep me");
        let extractor = FixedExtractor(Ok("Doc body"));

        let outcome = composer
            .on_attach_file(FilePick::Cancelled, &extractor, &mut state)
            .unwrap();

        assert_eq!(outcome, AttachOutcome::Cancelled);
        assert_eq!(composer.draft(), "keep me");
        assert!(state.generate_requests.is_empty());
    }

    #[test]
    fn picked_file_becomes_draft_and_is_forwarded() {
        let mut state = RecordingState::ready();
        let mut composer = composer_with("old draft");
        let extractor = FixedExtractor(Ok("Doc body"));

        let outcome = composer
            .on_attach_file(FilePick::Picked("notes.pdf".into()), &extractor, &mut state)
            .unwrap();

        assert_eq!(outcome, AttachOutcome::Forwarded);
        assert_eq!(composer.draft(), "Doc body");
        assert_eq!(state.generate_requests, vec!["Doc body"]);
    }

    #[test]
    fn picked_file_while_busy_is_only_drafted() {
        let mut state = RecordingState::busy();
        let mut composer = Composer::new();
        let extractor = FixedExtractor(Ok("Doc body"));

        let outcome = composer
            .on_attach_file(FilePick::Picked("notes.pdf".into()), &extractor, &mut state)
            .unwrap();

        assert_eq!(outcome, AttachOutcome::Drafted);
        assert_eq!(composer.draft(), "Doc body");
        assert!(state.generate_requests.is_empty());
    }

    #[test]
    fn failed_extraction_changes_nothing() {
        let mut state = RecordingState::ready();
        let mut composer = composer_with("draft");
        let extractor = FixedExtractor(Err("corrupt"));

        let result = composer.on_attach_file(FilePick::Picked("bad.pdf".into()), &extractor, &mut state);

        assert!(matches!(result, Err(ExtractError::Parse(_))));
        assert_eq!(composer.draft(), "draft");
        assert!(state.generate_requests.is_empty());
    }

    #[test]
    fn editing_is_utf8_safe() {
        let mut composer = Composer::new();
        for c in "héllo".chars() {
            composer.insert_char(c);
        }
        composer.move_left();
        composer.move_left();
        composer.insert_char('ü');
        assert_eq!(composer.draft(), "hélülo");

        composer.backspace();
        composer.delete();
        assert_eq!(composer.draft(), "hélo");

        composer.move_home();
        composer.delete();
        assert_eq!(composer.draft(), "élo");

        composer.move_end();
        composer.insert_str(" wörld");
        assert_eq!(composer.draft(), "élo wörld");
        assert_eq!(composer.cursor(), 9);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut composer = composer_with("ab");
        composer.move_right();
        assert_eq!(composer.cursor(), 2);

        composer.move_home();
        composer.move_left();
        composer.backspace();
        assert_eq!(composer.cursor(), 0);
        assert_eq!(composer.draft(), "ab");
    }
}
