use mygpt_core::render::{self, MessageRow, RowAlignment, BUBBLE_PADDING};
use mygpt_core::{ChatScreen, ChatState, MessageRole, SessionState};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, Screen};
use crate::picker::FilePicker;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    match app.screen {
        Screen::Home => render_home_screen(app, frame, area),
        Screen::Chat => render_chat_screen(app, frame, area),
    }

    if let Some(picker) = app.file_picker.as_mut() {
        render_file_picker(picker, frame, area);
    }
}

fn key_style() -> Style {
    // Dark background with bright text for visibility on both light/dark terminals
    Style::default().bg(Color::DarkGray).fg(Color::White)
}

fn label_style() -> Style {
    Style::default().bg(Color::Black).fg(Color::White)
}

fn disabled_style() -> Style {
    Style::default().bg(Color::Black).fg(Color::DarkGray)
}

/// A key hint, dimmed when the action is unavailable
fn hint(key: &'static str, label: &'static str, enabled: bool) -> [Span<'static>; 2] {
    let label_style = if enabled { label_style() } else { disabled_style() };
    [
        Span::styled(format!(" {} ", key), key_style()),
        Span::styled(format!(" {} ", label), label_style),
    ]
}

fn render_footer(frame: &mut Frame, area: Rect, mode: &'static str, hints: Vec<[Span<'static>; 2]>) {
    let mode_style = Style::default().bg(Color::Blue).fg(Color::White);

    let footer_content = Line::from(
        vec![
            Span::styled(mode, mode_style),
            Span::styled(" ", label_style()),
        ]
        .into_iter()
        .chain(hints.into_iter().flatten())
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_home_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let title = Line::from(vec![
        Span::styled(format!(" {} ", ChatScreen::TITLE), Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(title).style(Style::default().bg(Color::DarkGray)),
        header_area,
    );

    let (list_area, error_area) = if app.models_error.is_some() {
        let [list_area, error_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(body_area);
        (list_area, Some(error_area))
    } else {
        (body_area, None)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Choose a model ");

    let current = app.session.model().to_string();
    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|model| {
            let style = if *model == current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.model_state);

    if let (Some(error), Some(error_area)) = (app.models_error.as_deref(), error_area) {
        let error = Paragraph::new(error)
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(" Ollama "));
        frame.render_widget(error, error_area);
    }

    let has_models = !app.available_models.is_empty();
    render_footer(
        frame,
        footer_area,
        " HOME ",
        vec![
            hint("j/k", "nav", has_models),
            hint("Enter", "chat", has_models),
            hint("r", "refresh", true),
            hint("q", "quit", true),
        ],
    );
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [top_area, status_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_top_bar(app, frame, top_area);
    render_status_line(app, frame, status_area);
    render_messages(app, frame, chat_area);
    render_input(app, frame, input_area);

    let can_send = app.chat.can_send(&app.session);
    let interruptable = app.chat.reset_enabled(&app.session);
    let can_attach = app.session.chatable();
    render_footer(
        frame,
        footer_area,
        " CHAT ",
        vec![
            hint("Enter", "send", can_send),
            hint("^O", "attach PDF", can_attach),
            hint("PgUp/PgDn", "scroll", true),
            hint("^R", "reset", interruptable),
            hint("Esc", "back", interruptable),
            hint("^C", "quit", true),
        ],
    );
}

fn render_top_bar(app: &App, frame: &mut Frame, area: Rect) {
    let back_enabled = app.chat.back_enabled(&app.session);
    let reset_enabled = app.chat.reset_enabled(&app.session);
    let enabled = |on: bool| {
        if on {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)
        }
    };

    let mut spans = vec![
        Span::styled(" < Back ", enabled(back_enabled)),
        Span::raw(" "),
        Span::styled(ChatScreen::TITLE, Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("  {} ", app.session.model()), Style::default().fg(Color::Gray)),
    ];
    if app.session.state() == SessionState::Generating {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        spans.push(Span::styled(
            format!("thinking{:<3}", dots),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }

    let [left_area, right_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(9)]).areas(area);

    let bar_style = Style::default().bg(Color::DarkGray);
    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar_style), left_area);
    frame.render_widget(
        Paragraph::new(Span::styled(" Reset ", enabled(reset_enabled)))
            .alignment(Alignment::Right)
            .style(bar_style),
        right_area,
    );
}

fn render_status_line(app: &App, frame: &mut Frame, area: Rect) {
    let style = if app.chat.notice().is_some() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let status = app.chat.status_line(&app.session);
    frame.render_widget(Paragraph::new(format!(" {}", status)).style(style), area);
}

fn bubble_style(role: MessageRole) -> Style {
    match role {
        MessageRole::User => Style::default().bg(Color::Blue).fg(Color::White),
        MessageRole::Bot => Style::default().bg(Color::DarkGray).fg(Color::White),
    }
}

/// Pad every line of a row to the bubble width so the background reads as
/// one block
fn bubble_lines(row: &MessageRow) -> Vec<Line<'static>> {
    let style = bubble_style(row.role);
    let alignment = match row.alignment {
        RowAlignment::Start => Alignment::Left,
        RowAlignment::End => Alignment::Right,
    };
    let pad = " ".repeat(BUBBLE_PADDING);

    let mut lines: Vec<Line<'static>> = row
        .lines
        .iter()
        .map(|text| {
            let fill = row.width.saturating_sub(UnicodeWidthStr::width(text.as_str()));
            Line::from(Span::styled(
                format!("{pad}{text}{}{pad}", " ".repeat(fill)),
                style,
            ))
            .alignment(alignment)
        })
        .collect();

    for _ in 0..render::ROW_SPACING {
        lines.push(Line::default());
    }
    lines
}

fn render_messages(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner_area = block.inner(area);
    app.chat_area = Some(inner_area);
    app.chat_height = inner_area.height;
    app.chat_width = inner_area.width;

    if app.session.messages().is_empty() {
        let placeholder = Paragraph::new("Say hello, or attach a PDF with Ctrl+O")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    app.refresh_chat_rows();
    let max = app.max_chat_scroll();
    let scroll = if app.follow_bottom {
        max
    } else {
        app.chat_scroll.min(max)
    };
    app.chat_scroll = scroll;

    let lines = visible_lines(app.chat_rows(), scroll, inner_area.height as usize);
    let chat = Paragraph::new(Text::from(lines)).block(block);

    frame.render_widget(chat, area);
}

/// The `height` lines starting at line `scroll`, building bubbles only for
/// rows that intersect the window
fn visible_lines(rows: &[MessageRow], scroll: usize, height: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(height);
    let mut top = 0;

    for row in rows {
        let row_height = row.height();
        if top + row_height <= scroll {
            top += row_height;
            continue;
        }
        if top >= scroll + height {
            break;
        }
        let skip = scroll.saturating_sub(top);
        lines.extend(bubble_lines(row).into_iter().skip(skip));
        top += row_height;
    }

    lines.truncate(height);
    lines
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let composer = app.chat.composer();
    let accepting = app.file_picker.is_none();
    let border_color = if accepting { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Input ");

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_window(composer.draft(), composer.cursor(), inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if accepting {
        frame.set_cursor_position((area.x + cursor_x as u16 + 1, area.y + 1));
    }
}

/// Horizontally scroll the draft so the cursor (a char index) stays inside
/// `width` columns. Returns the visible text and the cursor column within it.
fn input_window(draft: &str, cursor: usize, width: usize) -> (String, usize) {
    // Newlines from pasted text would break the single-line box
    let cells: Vec<(char, usize)> = draft
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .map(|c| (c, UnicodeWidthChar::width(c).unwrap_or(0)))
        .collect();
    if width == 0 {
        return (String::new(), 0);
    }

    // Drop leading chars until the cursor column fits, keeping one cell for
    // the cursor itself
    let cursor_col: usize = cells.iter().take(cursor).map(|(_, w)| w).sum();
    let mut start = 0;
    let mut offset = 0;
    while cursor_col - offset >= width && start < cursor {
        offset += cells[start].1;
        start += 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for &(c, w) in &cells[start..] {
        if used + w > width {
            break;
        }
        visible.push(c);
        used += w;
    }

    (visible, cursor_col - offset)
}

fn render_file_picker(picker: &mut FilePicker, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 64.min(area.width.saturating_sub(4));
    let popup_height = (picker.entries().len() as u16 + 3)
        .max(5)
        .min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Attach PDF (Enter to open, Esc to cancel) ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [dir_area, list_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let dir_line = match &picker.error {
        Some(error) => Span::styled(format!(" {}", error), Style::default().fg(Color::Red)),
        None => Span::styled(
            format!(" {}", picker.dir().display()),
            Style::default().fg(Color::DarkGray),
        ),
    };
    frame.render_widget(Paragraph::new(dir_line), dir_area);

    let items: Vec<ListItem> = picker
        .entries()
        .iter()
        .map(|entry| {
            let style = match entry {
                crate::picker::PickerEntry::File(_) => Style::default(),
                _ => Style::default().fg(Color::Yellow),
            };
            ListItem::new(format!(" {} ", entry.label())).style(style)
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut picker.state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mygpt_core::{Config, MessageData, MessageId};
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        App::new(Config::new(), "http://127.0.0.1:9", Some("test-model".to_string()))
    }

    fn draw(app: &mut App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn home_lists_models() {
        let mut app = app();
        let screen = draw(&mut app);
        assert!(screen.contains("Choose a model"));
        assert!(screen.contains("test-model"));
    }

    #[tokio::test]
    async fn chat_shows_bubbles_and_records_area() {
        let mut app = app();
        app.open_chat();
        app.chat.edit().on_text_changed("Hello there");
        app.send();

        let screen = draw(&mut app);

        assert!(screen.contains("MyGPT"));
        assert!(screen.contains("Hello there"));
        assert!(screen.contains("Generating..."));
        assert_eq!(app.chat_width, 78);
        assert!(app.chat_area.is_some());
    }

    #[test]
    fn notice_replaces_status() {
        let mut app = app();
        app.open_chat();
        app.chat.set_notice("Could not read file: broken");

        let screen = draw(&mut app);

        assert!(screen.contains("Could not read file: broken"));
    }

    #[test]
    fn user_rows_are_right_aligned() {
        let row = MessageRow {
            id: MessageId::new(0),
            role: MessageRole::User,
            alignment: RowAlignment::End,
            lines: vec!["hi".to_string(), "there".to_string()],
            width: 5,
        };

        let lines = bubble_lines(&row);

        assert_eq!(lines.len(), 2 + render::ROW_SPACING);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
        assert_eq!(lines[0].spans[0].content, " hi    ");
        assert_eq!(lines[1].spans[0].content, " there ");
    }

    #[test]
    fn empty_bot_message_still_draws_a_bubble() {
        let messages = [MessageData::new(MessageId::new(0), MessageRole::Bot, "")];
        let rows = render::render_rows(&messages, 40);

        let lines = bubble_lines(&rows[0]);

        assert_eq!(lines[0].alignment, Some(Alignment::Left));
        assert_eq!(lines[0].spans[0].content, "  ");
    }

    #[test]
    fn window_past_u16_range_shows_last_lines() {
        let text = (0..70_000)
            .map(|i| format!("line{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let messages = [
            MessageData::new(MessageId::new(0), MessageRole::User, text),
            MessageData::new(MessageId::new(1), MessageRole::Bot, ""),
        ];
        let rows = render::render_rows(&messages, 40);

        // Last useful offset for a 10-line view: 70 003 lines minus the
        // trailing spacer and the view height
        let lines = visible_lines(&rows, 69_992, 10);

        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0].spans[0].content.trim(), "line69992");
        assert_eq!(lines[7].spans[0].content.trim(), "line69999");
        assert!(lines[8].spans.is_empty());
        assert_eq!(lines[9].alignment, Some(Alignment::Left));
    }

    #[test]
    fn window_starts_mid_row() {
        let messages = [MessageData::new(MessageId::new(0), MessageRole::Bot, "a\nb\nc")];
        let rows = render::render_rows(&messages, 40);

        let lines = visible_lines(&rows, 1, 5);

        // "b", "c" and the spacer
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].spans[0].content.trim(), "b");
    }

    #[tokio::test]
    async fn long_conversation_follows_bottom_when_drawn() {
        let mut app = app();
        app.open_chat();
        let text = (0..70_000)
            .map(|i| format!("line{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        app.chat.edit().on_text_changed(text);
        app.send();
        app.sync_chat();

        let screen = draw(&mut app);

        assert!(screen.contains("line69999"));
        assert!(app.chat_scroll > u16::MAX as usize);
    }

    #[test]
    fn input_scrolls_to_keep_cursor_visible() {
        assert_eq!(input_window("hello", 5, 10), ("hello".to_string(), 5));
        assert_eq!(input_window("abcdefgh", 8, 4), ("fgh".to_string(), 3));
        assert_eq!(input_window("abcdefgh", 0, 4), ("abcd".to_string(), 0));
    }

    #[test]
    fn input_cursor_counts_display_columns() {
        // Two wide chars before the cursor put it at column 4
        assert_eq!(input_window("日本x", 2, 10), ("日本x".to_string(), 4));
        // Scrolling drops whole wide chars
        assert_eq!(input_window("日本語", 3, 4), ("語".to_string(), 2));
    }

    #[test]
    fn wide_text_bubble_is_padded_by_columns() {
        let messages = [MessageData::new(MessageId::new(0), MessageRole::Bot, "日本\nab")];
        let rows = render::render_rows(&messages, 40);

        let lines = bubble_lines(&rows[0]);

        assert_eq!(lines[0].spans[0].content, " 日本 ");
        assert_eq!(lines[1].spans[0].content, " ab   ");
    }

    #[test]
    fn picker_popup_renders_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("paper.pdf"), b"%PDF").unwrap();
        let mut app = app();
        app.open_chat();
        app.file_picker = Some(FilePicker::open(dir.path().to_path_buf()));

        let screen = draw(&mut app);

        assert!(screen.contains("Attach PDF"));
        assert!(screen.contains("paper.pdf"));
    }
}
