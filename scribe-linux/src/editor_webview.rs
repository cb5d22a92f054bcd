use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gtk4::prelude::*;
use webkit6::prelude::*;

use scribe_core::Language;
use scribe_editor::css::sanitize_image_data_url;
use scribe_editor::protocol::{ContentVersion, EditorCommand, EditorEvent, Theme};
use scribe_editor::syntax::syntax_rules;

/// Handle for talking to the editor page running inside a WebView.
pub struct EditorHandle {
    webview: webkit6::WebView,
    /// Last content known to be on the page.
    pub cached_content: RefCell<String>,
    pub is_ready: Cell<bool>,
    pub version: Cell<ContentVersion>,
    /// Commands issued before the page reported ready.
    queued: RefCell<Vec<EditorCommand>>,
}

impl EditorHandle {
    fn send_command(&self, cmd: EditorCommand) {
        if !self.is_ready.get() {
            self.queued.borrow_mut().push(cmd);
            return;
        }
        let json = match serde_json::to_string(&cmd) {
            Ok(j) => j,
            Err(e) => {
                log::error!("Failed to serialize EditorCommand: {}", e);
                return;
            }
        };
        // Escape for embedding in a JS string literal
        let escaped = json
            .replace('\\', "\\\\")
            .replace('\'', "\\'")
            .replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029");
        let script = format!("scribeReceiveCommand('{}')", escaped);
        self.webview.evaluate_javascript(
            &script,
            None,
            None,
            None::<&gtk4::gio::Cancellable>,
            |result| {
                if let Err(e) = result {
                    log::warn!("Editor command failed: {}", e);
                }
            },
        );
    }

    fn flush_queue(&self) {
        let queued: Vec<_> = self.queued.borrow_mut().drain(..).collect();
        for cmd in queued {
            self.send_command(cmd);
        }
    }

    /// Replace the page content unless it already shows `content`.
    pub fn set_content(&self, content: &str, language: Language) {
        let syntax = syntax_rules(language);
        if *self.cached_content.borrow() == content && self.is_ready.get() {
            self.send_command(EditorCommand::SetLanguage { language, syntax });
            return;
        }
        *self.cached_content.borrow_mut() = content.to_string();
        let mut version = self.version.get();
        let generation = version.next_generation();
        self.version.set(version);
        self.send_command(EditorCommand::SetContent {
            content: content.to_string(),
            language,
            syntax,
            generation,
        });
    }

    pub fn set_theme(&self, theme: Theme) {
        self.webview.set_background_color(&crate::theme::bg_rgba(theme));
        self.send_command(EditorCommand::SetTheme { theme });
    }

    pub fn set_background_image(&self, data_url: Option<&str>) {
        let data_url = match data_url {
            Some(url) => match sanitize_image_data_url(url) {
                Some(clean) => Some(clean),
                None => {
                    log::warn!("Refusing unsupported background image");
                    return;
                }
            },
            None => None,
        };
        self.send_command(EditorCommand::SetBackgroundImage { data_url });
    }

    pub fn set_zoom_level(&self, level: f64) {
        self.webview.set_zoom_level(level);
    }

    pub fn relayout(&self) {
        self.send_command(EditorCommand::Relayout);
    }
}

/// Create the editor widget.
///
/// `on_event` receives every `EditorEvent` the page posts, after the handle's
/// own bookkeeping (ready flag, cached content) has been updated.
pub fn create_editor<F>(theme: Theme, on_event: F) -> (webkit6::WebView, Rc<EditorHandle>)
where
    F: Fn(&EditorHandle, EditorEvent) + 'static,
{
    let user_content_manager = webkit6::UserContentManager::new();

    let webview = webkit6::WebView::builder()
        .user_content_manager(&user_content_manager)
        .hexpand(true)
        .vexpand(true)
        .build();

    // Match the theme so there is no flash while the page loads
    webview.set_background_color(&crate::theme::bg_rgba(theme));

    if let Some(wk_settings) = webkit6::prelude::WebViewExt::settings(&webview) {
        wk_settings.set_enable_javascript(true);
        wk_settings.set_enable_developer_extras(cfg!(debug_assertions));
    }

    let handle = Rc::new(EditorHandle {
        webview: webview.clone(),
        cached_content: RefCell::new(String::new()),
        is_ready: Cell::new(false),
        version: Cell::new(ContentVersion::default()),
        queued: RefCell::new(Vec::new()),
    });

    let handle_for_signal = handle.clone();
    user_content_manager.register_script_message_handler("scribe", None);
    user_content_manager.connect_script_message_received(Some("scribe"), move |_ucm, value| {
        let json_str = value.to_str().to_string();

        let event: EditorEvent = match serde_json::from_str(&json_str) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Failed to parse EditorEvent: {} (json: {})", e, json_str);
                return;
            }
        };

        match &event {
            EditorEvent::Ready => {
                handle_for_signal.is_ready.set(true);
                handle_for_signal.flush_queue();
            }
            EditorEvent::ContentChanged {
                content,
                generation,
                version,
            } => {
                // Drop edits to a buffer that has since been replaced
                let mut versions = handle_for_signal.version.get();
                if !versions.accept(*generation, *version) {
                    log::debug!("Stale edit {}.{} ignored", generation, version);
                    return;
                }
                handle_for_signal.version.set(versions);
                *handle_for_signal.cached_content.borrow_mut() = content.clone();
            }
            _ => {}
        }

        on_event(&handle_for_signal, event);
    });

    webview.load_html(&scribe_editor::assets::editor_document(), None);

    (webview, handle)
}

/// Create the read-only preview pane.
pub fn create_preview(theme: Theme) -> webkit6::WebView {
    let webview = webkit6::WebView::builder().hexpand(true).vexpand(true).build();
    webview.set_background_color(&crate::theme::bg_rgba(theme));
    if let Some(wk_settings) = webkit6::prelude::WebViewExt::settings(&webview) {
        wk_settings.set_enable_javascript(true);
    }
    webview
}
