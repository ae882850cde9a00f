use mygpt_core::render::{self, ROW_SPACING};
use mygpt_core::{
    AttachOutcome, ChatScreen, ChatSession, ChatState, Config, FilePick, MessageRow, OllamaClient,
    PdfTextExtractor, ScrollCommand, SessionUpdate,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::{info, warn};

use crate::picker::FilePicker;

pub const FALLBACK_MODEL: &str = "llama3.2:latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Chat,
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,

    // Conversation owner and the screen talking to it
    pub session: ChatSession<OllamaClient>,
    pub chat: ChatScreen,
    pub extractor: PdfTextExtractor,
    pub file_picker: Option<FilePicker>,

    // Home screen model list
    pub available_models: Vec<String>,
    pub model_state: ListState,
    pub models_error: Option<String>,

    // Chat list scrolling, in lines
    pub chat_scroll: usize,
    pub follow_bottom: bool,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub chat_width: u16,  // inner width of the chat area, set during render
    pub chat_area: Option<Rect>,

    // Wrapped bubbles, rebuilt when the session version or width changes
    chat_rows: Vec<MessageRow>,
    rows_key: Option<(u64, u16)>,
    seen_version: Option<u64>,

    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub config: Config,
}

impl App {
    pub fn new(config: Config, ollama_url: &str, model: Option<String>) -> Self {
        let model = model
            .or_else(|| config.default_model.clone())
            .unwrap_or_else(|| FALLBACK_MODEL.to_string());

        let ollama = OllamaClient::new(ollama_url);
        info!(url = ollama.base_url(), %model, "starting");

        Self {
            should_quit: false,
            screen: Screen::Home,

            session: ChatSession::new(ollama, model.clone()),
            chat: ChatScreen::new(),
            extractor: PdfTextExtractor::new(),
            file_picker: None,

            available_models: vec![model],
            model_state: {
                let mut state = ListState::default();
                state.select(Some(0));
                state
            },
            models_error: None,

            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            chat_rows: Vec::new(),
            rows_key: None,
            seen_version: None,

            animation_frame: 0,

            config,
        }
    }

    /// Ask Ollama for installed models, keeping the current one selected
    pub async fn refresh_models(&mut self) {
        match self.session.backend().list_models().await {
            Ok(models) if !models.is_empty() => {
                self.available_models = models;
                self.models_error = None;
            }
            Ok(_) => {
                self.models_error =
                    Some("No models installed. Pull one with: ollama pull llama3.2".to_string());
            }
            Err(e) => {
                warn!(error = %e, "could not list models");
                self.models_error = Some(format!(
                    "Could not reach Ollama at {}: {}",
                    self.session.backend().base_url(),
                    e
                ));
            }
        }

        let current = self.session.model().to_string();
        if !self.available_models.contains(&current) {
            // Keep the configured model selectable even if the server does not list it
            self.available_models.insert(0, current.clone());
        }
        let idx = self
            .available_models
            .iter()
            .position(|m| *m == current)
            .unwrap_or(0);
        self.model_state.select(Some(idx));
    }

    pub fn selected_model(&self) -> Option<&String> {
        self.model_state
            .selected()
            .and_then(|i| self.available_models.get(i))
    }

    pub fn model_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_state.selected().unwrap_or(0);
            self.model_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_nav_up(&mut self) {
        let i = self.model_state.selected().unwrap_or(0);
        self.model_state.select(Some(i.saturating_sub(1)));
    }

    /// Enter the chat with the selected model. Switching models starts a
    /// fresh conversation.
    pub fn open_chat(&mut self) {
        let Some(model) = self.selected_model().cloned() else {
            return;
        };

        if model != self.session.model() {
            self.session.set_model(model.clone());
            if !self.session.messages().is_empty() {
                self.session.request_reset_chat();
            }
            if let Err(e) = Config::save_default_model(&model) {
                warn!(error = %e, "could not save default model");
            }
        }

        self.screen = Screen::Chat;
        self.follow_bottom = true;
    }

    pub fn go_back(&mut self) {
        if self.chat.on_back(&self.session) {
            self.screen = Screen::Home;
        }
    }

    pub fn reset_chat(&mut self) {
        self.chat.on_reset(&mut self.session);
    }

    pub fn send(&mut self) {
        if self.chat.on_send(&mut self.session) {
            self.follow_bottom = true;
        }
    }

    pub fn open_file_picker(&mut self) {
        self.file_picker = Some(FilePicker::open(self.config.documents_dir()));
    }

    /// Close the picker and hand its result to the chat screen
    pub fn complete_file_pick(&mut self, pick: FilePick) {
        self.file_picker = None;
        let outcome = self.chat.on_attach(pick, &self.extractor, &mut self.session);
        if outcome == AttachOutcome::Forwarded {
            self.follow_bottom = true;
        }
    }

    pub fn apply_session_update(&mut self, update: SessionUpdate) {
        self.session.apply(update);
    }

    /// Poll the session and act on the resulting scroll command. Does
    /// nothing while the session version is unchanged.
    pub fn sync_chat(&mut self) {
        let version = self.session.version();
        if self.seen_version == Some(version) {
            return;
        }
        self.seen_version = Some(version);

        self.chat.sync(&self.session);
        if let Some(command) = self.chat.take_scroll() {
            self.apply_scroll(command);
        }
    }

    fn apply_scroll(&mut self, command: ScrollCommand) {
        let ScrollCommand::ToIndex(index) = command;
        self.refresh_chat_rows();

        if index >= self.chat_rows.len() {
            self.follow_bottom = true;
        } else {
            self.follow_bottom = false;
            self.chat_scroll = render::row_top(&self.chat_rows, index);
        }
    }

    /// Re-wrap the conversation if it or the list width changed since the
    /// last call
    pub fn refresh_chat_rows(&mut self) {
        let key = (self.session.version(), self.chat_width);
        if self.rows_key != Some(key) {
            self.chat_rows = render::render_rows(self.session.messages(), self.chat_width as usize);
            self.rows_key = Some(key);
        }
    }

    /// Rows as of the last `refresh_chat_rows`
    pub fn chat_rows(&self) -> &[MessageRow] {
        &self.chat_rows
    }

    /// Largest useful scroll offset for the cached rows and current viewport
    pub fn max_chat_scroll(&self) -> usize {
        max_scroll(&self.chat_rows, self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.refresh_chat_rows();
        if self.follow_bottom {
            self.chat_scroll = self.max_chat_scroll();
            self.follow_bottom = false;
        }
        self.chat_scroll = self.chat_scroll.saturating_sub(lines as usize);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        if self.follow_bottom {
            return;
        }
        self.refresh_chat_rows();
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines as usize).min(max);
        if self.chat_scroll >= max {
            self.follow_bottom = true;
        }
    }

    pub fn tick_animation(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
    }
}

fn max_scroll(rows: &[MessageRow], height: u16) -> usize {
    // The trailing spacing line of the last row is not worth scrolling to
    let total = render::total_height(rows).saturating_sub(ROW_SPACING);
    total.saturating_sub(height as usize)
}
