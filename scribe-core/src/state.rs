use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::language::Language;
use crate::layout::SplitMode;

/// Environment variable overriding where the snapshot is kept.
pub const STATE_PATH_ENV: &str = "SCRIBE_STATE_PATH";

const STATE_FILE: &str = "app-state.json";

/// Window-level preferences persisted between runs, written to
/// `<data dir>/scribe/app-state.json`.
///
/// This is a best-effort snapshot: it is overwritten wholesale on every save
/// and discarded if it cannot be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub editor_content: String,
    pub editor_language: Language,
    pub current_file_path: Option<String>,
    pub split_mode: SplitMode,
    pub is_dark_mode: bool,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            editor_content: String::new(),
            editor_language: Language::Plaintext,
            current_file_path: None,
            split_mode: SplitMode::Horizontal,
            is_dark_mode: true,
        }
    }
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StateStore { path: path.into() }
    }

    /// `$SCRIBE_STATE_PATH` if set, otherwise the per-user data directory
    /// (falling back to the temp dir when no home can be determined).
    pub fn default_location() -> Self {
        if let Some(path) = std::env::var_os(STATE_PATH_ENV) {
            return StateStore::new(path);
        }
        let base = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        StateStore::new(base.join("scribe").join(STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, state: &AppState) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create state directory: {}", e))?;
        }
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| format!("Failed to serialize app state: {}", e))?;
        std::fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write app state: {}", e))?;
        log::debug!("App state saved to {}", self.path.display());
        Ok(())
    }

    /// Load the snapshot. A corrupt file is removed so the next run starts clean.
    pub fn load(&self) -> Option<AppState> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => {
                log::debug!("No saved state at {}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!(
                    "Discarding unreadable app state {}: {}",
                    self.path.display(),
                    e
                );
                if let Err(e) = std::fs::remove_file(&self.path) {
                    log::error!("Failed to remove corrupt app state: {}", e);
                }
                None
            }
        }
    }
}
