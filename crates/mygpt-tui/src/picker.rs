use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ratatui::widgets::ListState;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEntry {
    Parent,
    Dir(String),
    File(String),
}

impl PickerEntry {
    pub fn label(&self) -> String {
        match self {
            PickerEntry::Parent => "../".to_string(),
            PickerEntry::Dir(name) => format!("{}/", name),
            PickerEntry::File(name) => name.clone(),
        }
    }
}

/// Popup for choosing a PDF: directories first, then `*.pdf` files
pub struct FilePicker {
    dir: PathBuf,
    entries: Vec<PickerEntry>,
    pub state: ListState,
    pub error: Option<String>,
}

impl FilePicker {
    pub fn open(dir: PathBuf) -> Self {
        let mut picker = Self {
            dir,
            entries: Vec::new(),
            state: ListState::default(),
            error: None,
        };
        picker.reload();
        picker
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[PickerEntry] {
        &self.entries
    }

    fn reload(&mut self) {
        match read_entries(&self.dir) {
            Ok(entries) => {
                self.entries = entries;
                self.error = None;
            }
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "could not list directory");
                self.entries = if self.dir.parent().is_some() {
                    vec![PickerEntry::Parent]
                } else {
                    Vec::new()
                };
                self.error = Some(e.to_string());
            }
        }
        self.state.select(if self.entries.is_empty() { None } else { Some(0) });
    }

    pub fn nav_down(&mut self) {
        let len = self.entries.len();
        if len > 0 {
            let i = self.state.selected().unwrap_or(0);
            self.state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn nav_up(&mut self) {
        let i = self.state.selected().unwrap_or(0);
        self.state.select(Some(i.saturating_sub(1)));
    }

    pub fn go_parent(&mut self) {
        if let Some(parent) = self.dir.parent() {
            self.dir = parent.to_path_buf();
            self.reload();
        }
    }

    /// Descend into the selected directory, or return the selected file
    pub fn enter(&mut self) -> Option<PathBuf> {
        let entry = self
            .state
            .selected()
            .and_then(|i| self.entries.get(i))
            .cloned()?;

        match entry {
            PickerEntry::Parent => {
                self.go_parent();
                None
            }
            PickerEntry::Dir(name) => {
                self.dir = self.dir.join(name);
                self.reload();
                None
            }
            PickerEntry::File(name) => Some(self.dir.join(name)),
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn read_entries(dir: &Path) -> io::Result<Vec<PickerEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Hidden entries only add noise here
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            dirs.push(name);
        } else if is_pdf(&path) {
            files.push(name);
        }
    }

    dirs.sort_by_key(|name| name.to_lowercase());
    files.sort_by_key(|name| name.to_lowercase());

    let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
    if dir.parent().is_some() {
        entries.push(PickerEntry::Parent);
    }
    entries.extend(dirs.into_iter().map(PickerEntry::Dir));
    entries.extend(files.into_iter().map(PickerEntry::File));
    Ok(entries)
}
