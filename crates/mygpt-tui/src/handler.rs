use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use mygpt_core::FilePick;
use ratatui::layout::Rect;

use crate::app::{App, Screen};
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => {
            if app.screen == Screen::Chat && app.file_picker.is_none() {
                app.chat.edit().insert_str(&text);
            }
        }
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // File picker popup takes all keys while open
    if app.file_picker.is_some() {
        handle_picker_key(app, key);
        return Ok(());
    }

    match app.screen {
        Screen::Home => handle_home_key(app, key).await,
        Screen::Chat => handle_chat_key(app, key),
    }
    Ok(())
}

async fn handle_home_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.model_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_nav_up(),
        KeyCode::Char('r') => app.refresh_models().await,
        KeyCode::Enter => app.open_chat(),
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.go_back(),
        KeyCode::Enter => app.send(),

        // Top bar and attach actions
        KeyCode::Char('r') if ctrl => app.reset_chat(),
        KeyCode::Char('o') if ctrl => app.open_file_picker(),

        // Message list scrolling
        KeyCode::PageUp => app.scroll_up((app.chat_height / 2).max(1)),
        KeyCode::PageDown => app.scroll_down((app.chat_height / 2).max(1)),

        // Draft editing
        KeyCode::Backspace => app.chat.edit().backspace(),
        KeyCode::Delete => app.chat.edit().delete(),
        KeyCode::Left => app.chat.edit().move_left(),
        KeyCode::Right => app.chat.edit().move_right(),
        KeyCode::Home => app.chat.edit().move_home(),
        KeyCode::End => app.chat.edit().move_end(),
        KeyCode::Char(c) if !ctrl => app.chat.edit().insert_char(c),
        _ => {}
    }
}

fn handle_picker_key(app: &mut App, key: KeyEvent) {
    let Some(picker) = app.file_picker.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => app.complete_file_pick(FilePick::Cancelled),
        KeyCode::Char('j') | KeyCode::Down => picker.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => picker.nav_up(),
        KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => picker.go_parent(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            if let Some(path) = picker.enter() {
                app.complete_file_pick(FilePick::Picked(path));
            }
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Chat || app.file_picker.is_some() {
        return;
    }

    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_LINES),
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_LINES),
        _ => {}
    }
}
