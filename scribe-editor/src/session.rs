use std::path::Path;

use scribe_core::files::DEFAULT_SAVE_NAME;
use scribe_core::state::AppState;
use scribe_core::{Language, SplitMode};

use crate::preview::DEFAULT_MERMAID_DIAGRAM;
use crate::protocol::{InboundEvent, InvokeCall, OpenFileResult, Theme};

pub const WELCOME_TEXT: &str = "// Welcome to Scribe\n// Start editing your code here...";

/// Page zoom bounds and step, in percent.
const ZOOM_DEFAULT: u16 = 100;
const ZOOM_MIN: u16 = 50;
const ZOOM_MAX: u16 = 300;
const ZOOM_STEP: u16 = 10;

/// Arguments of a `save-file` invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub content: String,
    pub file_path: Option<String>,
}

impl From<SaveRequest> for InvokeCall {
    fn from(req: SaveRequest) -> Self {
        InvokeCall::SaveFile {
            content: req.content,
            file_path: req.file_path,
        }
    }
}

/// What the view has to do after a host event was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    None,
    /// Push content, language, theme and background to the widgets.
    Refresh,
    /// Split orientation changed.
    Relayout,
    RunOpen,
    RunSave,
    ShowError(String),
}

/// The document currently shown in the editor, plus the view state that
/// travels with it.
#[derive(Debug, Clone)]
pub struct Session {
    content: String,
    file_path: Option<String>,
    language: Language,
    split_mode: SplitMode,
    preview_visible: bool,
    theme: Theme,
    background_image: Option<String>,
    dirty: bool,
    zoom_percent: u16,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            content: WELCOME_TEXT.to_string(),
            file_path: None,
            language: Language::Plaintext,
            split_mode: SplitMode::Horizontal,
            preview_visible: true,
            theme: Theme::Dark,
            background_image: None,
            dirty: false,
            zoom_percent: ZOOM_DEFAULT,
        }
    }

    pub fn from_state(state: AppState) -> Self {
        Session {
            content: state.editor_content,
            file_path: state.current_file_path.filter(|p| !p.is_empty()),
            language: state.editor_language,
            split_mode: state.split_mode,
            preview_visible: state.editor_language.has_preview(),
            theme: Theme::from_dark_mode(state.is_dark_mode),
            background_image: None,
            dirty: false,
            zoom_percent: ZOOM_DEFAULT,
        }
    }

    pub fn to_state(&self) -> AppState {
        AppState {
            editor_content: self.content.clone(),
            editor_language: self.language,
            current_file_path: self.file_path.clone(),
            split_mode: self.split_mode,
            is_dark_mode: self.theme.is_dark(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn split_mode(&self) -> SplitMode {
        self.split_mode
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn background_image(&self) -> Option<&str> {
        self.background_image.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns true if the content actually changed.
    pub fn set_content(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if content == self.content {
            return false;
        }
        self.content = content;
        self.dirty = true;
        true
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.preview_visible = language.has_preview();
        // The starter diagram is an edit: it is not on disk yet
        if language == Language::Mermaid && self.content.trim().is_empty() {
            self.content = DEFAULT_MERMAID_DIAGRAM.to_string();
            self.dirty = true;
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Base name of the document, `untitled` before the first save.
    pub fn display_name(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(|p| Path::new(p).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_SAVE_NAME.to_string())
    }

    pub fn window_title(&self) -> String {
        let marker = if self.dirty { "*" } else { "" };
        format!("{}{} - Scribe", marker, self.display_name())
    }

    pub fn save_request(&self) -> SaveRequest {
        SaveRequest {
            content: self.content.clone(),
            file_path: self.file_path.clone(),
        }
    }

    pub fn apply_opened(&mut self, opened: OpenFileResult) {
        log::info!("Loaded {} ({} bytes)", opened.file_path, opened.content.len());
        self.content = opened.content;
        self.adopt_path(opened.file_path);
    }

    pub fn apply_saved(&mut self, path: impl Into<String>) {
        self.adopt_path(path.into());
    }

    fn adopt_path(&mut self, path: String) {
        self.dirty = false;
        self.set_language(Language::from_path(&path));
        self.file_path = Some(path);
    }

    /// Start over with an empty untitled document. View preferences survive.
    pub fn reset(&mut self) {
        self.content.clear();
        self.file_path = None;
        self.language = Language::Plaintext;
        self.preview_visible = false;
        self.dirty = false;
    }

    pub fn toggle_split_mode(&mut self) -> SplitMode {
        self.split_mode = self.split_mode.toggled();
        self.split_mode
    }

    pub fn toggle_preview(&mut self) -> bool {
        self.preview_visible = !self.preview_visible;
        self.preview_visible
    }

    pub fn preview_visible(&self) -> bool {
        self.preview_visible
    }

    /// Zoom factor for the editor and preview pages, 1.0 at default size.
    pub fn zoom_level(&self) -> f64 {
        f64::from(self.zoom_percent) / 100.0
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom_percent = (self.zoom_percent + ZOOM_STEP).min(ZOOM_MAX);
        self.zoom_level()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom_percent = self.zoom_percent.saturating_sub(ZOOM_STEP).max(ZOOM_MIN);
        self.zoom_level()
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.zoom_percent = ZOOM_DEFAULT;
        self.zoom_level()
    }

    /// Whether the preview pane should be on screen right now.
    pub fn wants_preview(&self) -> bool {
        self.preview_visible && self.language.has_preview()
    }

    pub fn apply_event(&mut self, event: &InboundEvent) -> SessionAction {
        match event {
            InboundEvent::ThemeChange { theme } => {
                self.theme = *theme;
                SessionAction::Refresh
            }
            InboundEvent::CustomImageSelected { data_url } => {
                self.background_image = Some(data_url.clone());
                SessionAction::Refresh
            }
            InboundEvent::ResetImage => {
                self.background_image = None;
                SessionAction::Refresh
            }
            InboundEvent::ImageSelectionError { message }
            | InboundEvent::FileSaveError { message }
            | InboundEvent::FileOpenError { message } => SessionAction::ShowError(message.clone()),
            InboundEvent::NewFile => {
                self.reset();
                SessionAction::Refresh
            }
            InboundEvent::OpenFile => SessionAction::RunOpen,
            InboundEvent::SaveFile => SessionAction::RunSave,
            InboundEvent::SplitModeChange { mode } => {
                if *mode == self.split_mode {
                    return SessionAction::None;
                }
                self.split_mode = *mode;
                SessionAction::Relayout
            }
            InboundEvent::FileSaved { file_path } => {
                self.apply_saved(file_path.clone());
                SessionAction::Refresh
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_untitled() {
        let session = Session::new();
        assert_eq!(session.display_name(), "untitled");
        assert_eq!(session.file_path(), None);
        assert_eq!(session.save_request().file_path, None);
        assert!(!session.is_dirty());
    }

    #[test]
    fn editing_marks_dirty_in_title() {
        let mut session = Session::new();
        assert!(session.set_content("x"));
        assert!(!session.set_content("x"));
        assert_eq!(session.window_title(), "*untitled - Scribe");
    }

    #[test]
    fn saving_renames_and_rederives_language() {
        let mut session = Session::new();
        session.set_content("# Hello");
        session.apply_saved("/tmp/notes.md");
        assert_eq!(session.display_name(), "notes.md");
        assert_eq!(session.language(), Language::Markdown);
        assert!(session.wants_preview());
        assert!(!session.is_dirty());
        assert_eq!(
            session.save_request(),
            SaveRequest {
                content: "# Hello".into(),
                file_path: Some("/tmp/notes.md".into()),
            }
        );
    }

    #[test]
    fn opening_replaces_document() {
        let mut session = Session::new();
        session.apply_opened(OpenFileResult {
            content: "fn main() {}".into(),
            file_path: "/src/main.rs".into(),
        });
        assert_eq!(session.content(), "fn main() {}");
        assert_eq!(session.language(), Language::Rust);
        assert!(!session.wants_preview());
    }

    #[test]
    fn empty_mermaid_gets_starter_diagram() {
        let mut session = Session::new();
        session.apply_opened(OpenFileResult {
            content: "  \n".into(),
            file_path: "/tmp/flow.mmd".into(),
        });
        assert_eq!(session.content(), DEFAULT_MERMAID_DIAGRAM);
        assert!(session.is_dirty());
        assert_eq!(session.window_title(), "*flow.mmd - Scribe");
    }

    #[test]
    fn zoom_steps_and_clamps() {
        let mut session = Session::new();
        assert_eq!(session.zoom_in(), 1.1);
        assert_eq!(session.reset_zoom(), 1.0);
        for _ in 0..20 {
            session.zoom_out();
        }
        assert_eq!(session.zoom_level(), 0.5);
        for _ in 0..40 {
            session.zoom_in();
        }
        assert_eq!(session.zoom_level(), 3.0);
    }

    #[test]
    fn zoom_survives_new_file() {
        let mut session = Session::new();
        session.zoom_in();
        session.apply_event(&InboundEvent::NewFile);
        assert_eq!(session.zoom_level(), 1.1);
    }

    #[test]
    fn opening_non_empty_mermaid_stays_clean() {
        let mut session = Session::new();
        session.apply_opened(OpenFileResult {
            content: "graph LR\n  a --> b".into(),
            file_path: "/tmp/flow.mmd".into(),
        });
        assert!(!session.is_dirty());
    }

    #[test]
    fn file_saved_event_renames() {
        let mut session = Session::new();
        let action = session.apply_event(&InboundEvent::FileSaved {
            file_path: "/tmp/page.html".into(),
        });
        assert_eq!(action, SessionAction::Refresh);
        assert_eq!(session.file_path(), Some("/tmp/page.html"));
        assert_eq!(session.language(), Language::Html);
    }

    #[test]
    fn new_file_event_resets_document_but_keeps_view() {
        let mut session = Session::new();
        session.apply_saved("/tmp/a.md");
        session.apply_event(&InboundEvent::ThemeChange { theme: Theme::Light });
        session.toggle_split_mode();

        assert_eq!(session.apply_event(&InboundEvent::NewFile), SessionAction::Refresh);
        assert_eq!(session.content(), "");
        assert_eq!(session.display_name(), "untitled");
        assert_eq!(session.theme(), Theme::Light);
        assert_eq!(session.split_mode(), SplitMode::Vertical);
    }

    #[test]
    fn menu_events_request_invokes() {
        let mut session = Session::new();
        assert_eq!(session.apply_event(&InboundEvent::OpenFile), SessionAction::RunOpen);
        assert_eq!(session.apply_event(&InboundEvent::SaveFile), SessionAction::RunSave);
    }

    #[test]
    fn split_mode_change_only_relayouts_on_change() {
        let mut session = Session::new();
        let same = InboundEvent::SplitModeChange {
            mode: SplitMode::Horizontal,
        };
        let flip = InboundEvent::SplitModeChange {
            mode: SplitMode::Vertical,
        };
        assert_eq!(session.apply_event(&same), SessionAction::None);
        assert_eq!(session.apply_event(&flip), SessionAction::Relayout);
        assert_eq!(session.split_mode(), SplitMode::Vertical);
    }

    #[test]
    fn image_events_update_background() {
        let mut session = Session::new();
        session.apply_event(&InboundEvent::CustomImageSelected {
            data_url: "data:image/png;base64,AA==".into(),
        });
        assert_eq!(session.background_image(), Some("data:image/png;base64,AA=="));
        session.apply_event(&InboundEvent::ResetImage);
        assert_eq!(session.background_image(), None);
    }

    #[test]
    fn error_events_surface_message() {
        let mut session = Session::new();
        let action = session.apply_event(&InboundEvent::FileOpenError {
            message: "permission denied".into(),
        });
        assert_eq!(action, SessionAction::ShowError("permission denied".into()));
    }

    #[test]
    fn state_round_trip_keeps_preferences() {
        let mut session = Session::new();
        session.apply_saved("/tmp/x.json");
        session.set_theme(Theme::Light);
        session.toggle_split_mode();

        let restored = Session::from_state(session.to_state());
        assert_eq!(restored.file_path(), Some("/tmp/x.json"));
        assert_eq!(restored.language(), Language::Json);
        assert_eq!(restored.theme(), Theme::Light);
        assert_eq!(restored.split_mode(), SplitMode::Vertical);
        assert!(!restored.is_dirty());
    }

    #[test]
    fn save_request_becomes_invoke_call() {
        let call: InvokeCall = SaveRequest {
            content: "c".into(),
            file_path: None,
        }
        .into();
        assert_eq!(
            call,
            InvokeCall::SaveFile {
                content: "c".into(),
                file_path: None
            }
        );
    }
}
