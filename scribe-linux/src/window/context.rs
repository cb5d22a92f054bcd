use std::cell::{Cell, RefCell};
use std::rc::Rc;

use libadwaita as adw;

use scribe_editor::protocol::Theme;
use scribe_editor::{Bridge, Session};

use super::host_window::ChannelTransport;
use super::layout::LayoutDriver;
use crate::editor_webview::EditorHandle;

/// UI-side state shared between signal closures on the GTK main loop.
///
/// Everything here belongs to the UI half of the application; the host half
/// is only reachable through `bridge`.
#[derive(Clone)]
pub(crate) struct WindowContext {
    pub window: adw::ApplicationWindow,
    pub title: adw::WindowTitle,
    pub toast_overlay: adw::ToastOverlay,
    pub preview_btn: gtk4::ToggleButton,
    pub editor: Rc<EditorHandle>,
    pub preview: webkit6::WebView,
    pub layout: Rc<LayoutDriver>,
    pub session: Rc<RefCell<Session>>,
    pub bridge: Rc<Bridge<ChannelTransport>>,
    pub css: Rc<RefCell<Option<gtk4::CssProvider>>>,
    pub applied_theme: Rc<Cell<Option<Theme>>>,
}
