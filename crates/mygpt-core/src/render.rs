//! Projection of a conversation into chat bubbles.
//!
//! Bot messages hug the start of the line, user messages the end. Bubbles are
//! capped at [`BUBBLE_MAX_WIDTH`] columns and word-wrapped inside that width.
//! Nothing here looks at anything but the messages themselves.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::message::{MessageData, MessageId, MessageRole};

/// Widest a bubble's text may get, in columns
pub const BUBBLE_MAX_WIDTH: usize = 60;

/// Columns of padding on each side of the bubble text
pub const BUBBLE_PADDING: usize = 1;

/// Blank lines between consecutive bubbles
pub const ROW_SPACING: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAlignment {
    Start,
    End,
}

impl From<MessageRole> for RowAlignment {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::Bot => RowAlignment::Start,
            MessageRole::User => RowAlignment::End,
        }
    }
}

/// One rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: MessageId,
    pub role: MessageRole,
    pub alignment: RowAlignment,
    /// Wrapped text lines, never empty (an empty message is one blank line)
    pub lines: Vec<String>,
    /// Width of the widest line in columns
    pub width: usize,
}

impl MessageRow {
    /// Lines this row occupies, including the spacing below it
    pub fn height(&self) -> usize {
        self.lines.len() + ROW_SPACING
    }
}

/// Width available to bubble text when the list is `available` columns wide
pub fn bubble_width_limit(available: usize) -> usize {
    available
        .saturating_sub(2 * BUBBLE_PADDING)
        .min(BUBBLE_MAX_WIDTH)
        .max(1)
}

/// Render every message, in order, for a list `available` columns wide
pub fn render_rows(messages: &[MessageData], available: usize) -> Vec<MessageRow> {
    let limit = bubble_width_limit(available);

    messages
        .iter()
        .map(|msg| {
            let lines = wrap_text(msg.text(), limit);
            let width = lines
                .iter()
                .map(|l| UnicodeWidthStr::width(l.as_str()))
                .max()
                .unwrap_or(0);
            MessageRow {
                id: msg.id(),
                role: msg.role(),
                alignment: msg.role().into(),
                lines,
                width,
            }
        })
        .collect()
}

/// Total height of the rendered list in lines
pub fn total_height(rows: &[MessageRow]) -> usize {
    rows.iter().map(MessageRow::height).sum()
}

/// First line of row `index`. An index past the end yields the line just
/// after the last row.
pub fn row_top(rows: &[MessageRow], index: usize) -> usize {
    rows.iter().take(index).map(MessageRow::height).sum()
}

/// Wrap text to fit within `width` terminal columns.
///
/// Explicit newlines are kept, words are not broken unless a single word is
/// wider than the whole line. Widths are display columns, so wide characters
/// count double. Always returns at least one line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = UnicodeWidthStr::width(word);

            if current_len > 0 && current_len + 1 + word_len <= width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
                continue;
            }

            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            // Word starts a fresh line; hard-split it if it still does not fit
            for ch in word.chars() {
                let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
                if current_len > 0 && current_len + ch_width > width {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(ch);
                current_len += ch_width;
            }
        }

        lines.push(current);
    }

    lines
}
