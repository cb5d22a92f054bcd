//! Host-side file operations and message routing.
//!
//! Operations take the active window explicitly; the router is the single
//! owner of that window for the lifetime of the application.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;

use scribe_core::files::{self, FileError, OpenDialogOptions, SaveDialogOptions};
use scribe_core::image;
use scribe_core::SplitMode;

use crate::protocol::{
    Envelope, HostMessage, InboundEvent, InvokeCall, InvokeReply, OpenFileResult,
    OutboundMessage, Theme,
};

/// A native window able to present dialogs and receive events.
pub trait HostWindow {
    /// False once the window has been destroyed.
    fn is_open(&self) -> bool;

    /// Present an open dialog. `Ok(None)` when the user dismisses it.
    fn choose_open_path(
        &self,
        options: &OpenDialogOptions,
    ) -> impl Future<Output = Result<Option<PathBuf>, FileError>>;

    /// Present a save dialog. `Ok(None)` when the user dismisses it.
    fn choose_save_path(
        &self,
        options: &SaveDialogOptions,
    ) -> impl Future<Output = Result<Option<PathBuf>, FileError>>;

    /// Deliver an event to the UI hosted in this window.
    fn emit(&self, event: InboundEvent);
}

/// Let the user pick a document and read it.
pub async fn open_file<W: HostWindow>(window: &W) -> Option<OpenFileResult> {
    if !window.is_open() {
        log::error!("open-file: {}", FileError::InvalidWindow);
        return None;
    }

    let path = match window.choose_open_path(&OpenDialogOptions::documents()).await {
        Ok(Some(path)) => path,
        Ok(None) => {
            log::info!("Open cancelled by user");
            return None;
        }
        Err(e) => {
            report_open_error(window, &e);
            return None;
        }
    };

    let opened = files::path_to_string(&path).and_then(|file_path| {
        files::read_text(&path).map(|content| OpenFileResult { content, file_path })
    });
    match opened {
        Ok(opened) => {
            log::info!("Opened {}", path.display());
            Some(opened)
        }
        Err(e) => {
            report_open_error(window, &e);
            None
        }
    }
}

fn report_open_error<W: HostWindow>(window: &W, e: &FileError) {
    log::error!("Error opening file: {}", e);
    window.emit(InboundEvent::FileOpenError {
        message: e.to_string(),
    });
}

fn report_save_error<W: HostWindow>(window: &W, e: &FileError) {
    log::error!("Error saving file: {}", e);
    window.emit(InboundEvent::FileSaveError {
        message: e.to_string(),
    });
}

/// Write `content`, asking for a location first when `file_path` is missing
/// or a placeholder. Returns the path written.
pub async fn save_file<W: HostWindow>(
    window: &W,
    content: &str,
    file_path: Option<&str>,
) -> Option<String> {
    if !window.is_open() {
        log::error!("save-file: {}", FileError::InvalidWindow);
        return None;
    }

    let target = match file_path {
        Some(path) if !files::needs_save_dialog(Some(path)) => PathBuf::from(path),
        _ => {
            log::debug!("No usable path ({:?}), showing save dialog", file_path);
            match window.choose_save_path(&SaveDialogOptions::default()).await {
                Ok(Some(chosen)) => files::with_default_extension(chosen),
                Ok(None) => {
                    log::info!("Save cancelled by user");
                    return None;
                }
                Err(e) => {
                    report_save_error(window, &e);
                    return None;
                }
            }
        }
    };

    let written = files::path_to_string(&target)
        .and_then(|saved| files::write_text(&target, content).map(|()| saved));
    let saved = match written {
        Ok(saved) => saved,
        Err(e) => {
            report_save_error(window, &e);
            return None;
        }
    };

    log::info!("Saved {} ({} bytes)", saved, content.len());
    window.emit(InboundEvent::FileSaved {
        file_path: saved.clone(),
    });
    Some(saved)
}

/// Let the user pick a background image and hand it to the UI as a data URL.
pub async fn select_image<W: HostWindow>(window: &W) {
    if !window.is_open() {
        log::error!("select-image: {}", FileError::InvalidWindow);
        return;
    }

    let path = match window.choose_open_path(&OpenDialogOptions::images()).await {
        Ok(Some(path)) => path,
        Ok(None) => return,
        Err(e) => {
            log::error!("Error handling image selection: {}", e);
            window.emit(InboundEvent::ImageSelectionError {
                message: e.to_string(),
            });
            return;
        }
    };

    match image::image_to_data_url(&path) {
        Ok(data_url) => window.emit(InboundEvent::CustomImageSelected { data_url }),
        Err(message) => {
            log::error!("Error handling image selection: {}", message);
            window.emit(InboundEvent::ImageSelectionError { message });
        }
    }
}

/// Application controller on the host side: owns the window and answers
/// everything the UI puts on the wire.
pub struct HostRouter<W: HostWindow> {
    window: RefCell<Option<Rc<W>>>,
    split_mode: Cell<SplitMode>,
    theme: Cell<Theme>,
}

impl<W: HostWindow> HostRouter<W> {
    pub fn new(split_mode: SplitMode, theme: Theme) -> Self {
        HostRouter {
            window: RefCell::new(None),
            split_mode: Cell::new(split_mode),
            theme: Cell::new(theme),
        }
    }

    pub fn attach_window(&self, window: Rc<W>) {
        *self.window.borrow_mut() = Some(window);
    }

    pub fn detach_window(&self) -> Option<Rc<W>> {
        self.window.borrow_mut().take()
    }

    /// The attached window, if it is still open.
    pub fn window(&self) -> Option<Rc<W>> {
        self.window
            .borrow()
            .as_ref()
            .filter(|w| w.is_open())
            .cloned()
    }

    pub fn split_mode(&self) -> SplitMode {
        self.split_mode.get()
    }

    pub fn theme(&self) -> Theme {
        self.theme.get()
    }

    /// Handle one envelope. Invokes always produce a reply.
    pub async fn handle(&self, envelope: Envelope) -> Option<HostMessage> {
        match envelope {
            Envelope::Invoke { request_id, call } => {
                let reply = self.handle_invoke(call).await;
                Some(HostMessage::Reply { request_id, reply })
            }
            Envelope::Send { message } => {
                self.handle_message(message);
                None
            }
        }
    }

    async fn handle_invoke(&self, call: InvokeCall) -> InvokeReply {
        let Some(window) = self.window() else {
            log::error!("{}: main window not found", call.channel().as_str());
            return InvokeReply::Failed(FileError::InvalidWindow.to_string());
        };
        match call {
            InvokeCall::SaveFile { content, file_path } => {
                InvokeReply::Saved(save_file(&*window, &content, file_path.as_deref()).await)
            }
            InvokeCall::OpenFile => InvokeReply::Opened(open_file(&*window).await),
        }
    }

    fn handle_message(&self, message: OutboundMessage) {
        match message {
            OutboundMessage::NewFile => self.broadcast(InboundEvent::NewFile),
            OutboundMessage::ResetImage => self.broadcast(InboundEvent::ResetImage),
            OutboundMessage::UpdateSplitMode { mode } => {
                self.split_mode.set(mode);
                self.broadcast(InboundEvent::SplitModeChange { mode });
            }
        }
    }

    fn broadcast(&self, event: InboundEvent) {
        match self.window() {
            Some(window) => window.emit(event),
            None => log::warn!("No window to receive {}", event.channel().as_str()),
        }
    }

    // -----------------------------------------------------------------------
    // Menu entry points
    // -----------------------------------------------------------------------

    pub fn request_new(&self) {
        self.broadcast(InboundEvent::NewFile);
    }

    pub fn request_open(&self) {
        self.broadcast(InboundEvent::OpenFile);
    }

    pub fn request_save(&self) {
        self.broadcast(InboundEvent::SaveFile);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.theme.set(theme);
        self.broadcast(InboundEvent::ThemeChange { theme });
    }

    pub fn toggle_split_mode(&self) {
        let mode = self.split_mode.get().toggled();
        self.split_mode.set(mode);
        self.broadcast(InboundEvent::SplitModeChange { mode });
    }

    pub fn reset_image(&self) {
        self.broadcast(InboundEvent::ResetImage);
    }

    pub async fn select_image(&self) {
        match self.window() {
            Some(window) => select_image(&*window).await,
            None => log::error!("select-image: {}", FileError::InvalidWindow),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Default)]
    struct MockWindow {
        closed: Cell<bool>,
        open_choice: RefCell<Option<PathBuf>>,
        save_choice: RefCell<Option<PathBuf>>,
        dialog_failure: RefCell<Option<String>>,
        dialogs: Cell<u32>,
        events: RefCell<Vec<InboundEvent>>,
    }

    impl MockWindow {
        fn choosing_save(path: PathBuf) -> Self {
            let window = MockWindow::default();
            *window.save_choice.borrow_mut() = Some(path);
            window
        }

        fn choosing_open(path: PathBuf) -> Self {
            let window = MockWindow::default();
            *window.open_choice.borrow_mut() = Some(path);
            window
        }

        fn failing_dialogs(message: &str) -> Self {
            let window = MockWindow::default();
            *window.dialog_failure.borrow_mut() = Some(message.to_string());
            window
        }

        fn dialog_result(
            &self,
            choice: &RefCell<Option<PathBuf>>,
        ) -> Result<Option<PathBuf>, FileError> {
            self.dialogs.set(self.dialogs.get() + 1);
            match self.dialog_failure.borrow().as_ref() {
                Some(message) => Err(FileError::Dialog(message.clone())),
                None => Ok(choice.borrow().clone()),
            }
        }
    }

    impl HostWindow for MockWindow {
        fn is_open(&self) -> bool {
            !self.closed.get()
        }

        async fn choose_open_path(
            &self,
            _options: &OpenDialogOptions,
        ) -> Result<Option<PathBuf>, FileError> {
            self.dialog_result(&self.open_choice)
        }

        async fn choose_save_path(
            &self,
            _options: &SaveDialogOptions,
        ) -> Result<Option<PathBuf>, FileError> {
            self.dialog_result(&self.save_choice)
        }

        fn emit(&self, event: InboundEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    #[tokio::test]
    async fn save_with_real_path_writes_verbatim_without_dialog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.md");
        let path_str = path.to_str().unwrap();
        let window = MockWindow::default();

        let saved = save_file(&window, "# Title\n\nbody ✓", Some(path_str)).await;

        assert_eq!(saved.as_deref(), Some(path_str));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Title\n\nbody ✓");
        assert_eq!(window.dialogs.get(), 0);
        assert_eq!(
            *window.events.borrow(),
            vec![InboundEvent::FileSaved {
                file_path: path_str.to_string()
            }]
        );
    }

    #[tokio::test]
    async fn save_placeholder_goes_through_dialog() {
        let dir = tempdir().unwrap();
        let chosen = dir.path().join("out.txt");
        let window = MockWindow::choosing_save(chosen.clone());

        let saved = save_file(&window, "hi", Some("untitled.txt")).await;

        assert_eq!(saved, Some(chosen.to_string_lossy().into_owned()));
        assert_eq!(fs::read_to_string(&chosen).unwrap(), "hi");
        assert_eq!(window.dialogs.get(), 1);
    }

    #[tokio::test]
    async fn save_dialog_appends_extension_when_missing() {
        let dir = tempdir().unwrap();
        let window = MockWindow::choosing_save(dir.path().join("draft"));

        let saved = save_file(&window, "x", None).await.unwrap();

        assert!(saved.ends_with("draft.txt"));
        assert_eq!(fs::read_to_string(dir.path().join("draft.txt")).unwrap(), "x");
    }

    #[tokio::test]
    async fn cancelled_save_writes_nothing() {
        let dir = tempdir().unwrap();
        let window = MockWindow::default();

        for path in [None, Some(""), Some("untitled")] {
            assert_eq!(save_file(&window, "lost", path).await, None);
        }

        assert_eq!(window.dialogs.get(), 3);
        assert!(window.events.borrow().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn save_failure_emits_error_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("a.txt");
        let window = MockWindow::default();

        assert_eq!(save_file(&window, "x", path.to_str()).await, None);

        let events = window.events.borrow();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], InboundEvent::FileSaveError { message } if message.contains("a.txt")));
    }

    #[tokio::test]
    async fn repeated_save_rewrites_same_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("same.txt");
        let window = MockWindow::default();
        for _ in 0..2 {
            save_file(&window, "same", path.to_str()).await.unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "same");
        assert_eq!(window.events.borrow().len(), 2);
    }

    #[tokio::test]
    async fn open_after_save_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("round.rs");
        let content = "fn main() {\r\n    println!(\"héllo\");\n}\n";
        let window = MockWindow::choosing_open(path.clone());

        save_file(&window, content, path.to_str()).await.unwrap();
        let opened = open_file(&window).await.unwrap();

        assert_eq!(opened.content, content);
        assert_eq!(opened.file_path, path.to_string_lossy());
    }

    #[tokio::test]
    async fn cancelled_open_is_silent() {
        let window = MockWindow::default();
        assert_eq!(open_file(&window).await, None);
        assert!(window.events.borrow().is_empty());
    }

    #[tokio::test]
    async fn open_unreadable_file_emits_error_event() {
        let dir = tempdir().unwrap();
        let window = MockWindow::choosing_open(dir.path().join("vanished.txt"));
        assert_eq!(open_file(&window).await, None);
        assert!(matches!(
            window.events.borrow()[0],
            InboundEvent::FileOpenError { .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_open_path_is_refused() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"caf\xe9.txt"));
        fs::write(&path, "old").unwrap();
        let window = MockWindow::choosing_open(path.clone());

        assert_eq!(open_file(&window).await, None);
        assert!(matches!(
            &window.events.borrow()[0],
            InboundEvent::FileOpenError { message } if message.contains("UTF-8")
        ));

        // Nothing may be written next to the real file
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_save_choice_writes_nothing() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let window = MockWindow::choosing_save(dir.path().join(OsStr::from_bytes(b"caf\xe9.txt")));

        assert_eq!(save_file(&window, "new", None).await, None);
        assert!(matches!(
            window.events.borrow()[0],
            InboundEvent::FileSaveError { .. }
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_dialogs_emit_error_events() {
        let window = MockWindow::failing_dialogs("portal unavailable");

        assert_eq!(open_file(&window).await, None);
        assert_eq!(save_file(&window, "x", None).await, None);
        select_image(&window).await;

        let events = window.events.borrow();
        assert_eq!(window.dialogs.get(), 3);
        assert!(matches!(
            &events[0],
            InboundEvent::FileOpenError { message } if message.contains("portal unavailable")
        ));
        assert!(matches!(&events[1], InboundEvent::FileSaveError { .. }));
        assert!(matches!(&events[2], InboundEvent::ImageSelectionError { .. }));
    }

    #[tokio::test]
    async fn closed_window_aborts_before_dialog() {
        let window = MockWindow::choosing_open(PathBuf::from("/tmp/x.txt"));
        window.closed.set(true);
        assert_eq!(open_file(&window).await, None);
        assert_eq!(save_file(&window, "x", None).await, None);
        assert_eq!(window.dialogs.get(), 0);
        assert!(window.events.borrow().is_empty());
    }

    #[tokio::test]
    async fn select_image_emits_data_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bg.png");
        fs::write(&path, b"png").unwrap();
        let window = MockWindow::choosing_open(path);

        select_image(&window).await;

        assert!(matches!(
            &window.events.borrow()[0],
            InboundEvent::CustomImageSelected { data_url } if data_url.starts_with("data:image/png;base64,")
        ));
    }

    #[tokio::test]
    async fn select_unsupported_image_emits_error() {
        let window = MockWindow::choosing_open(PathBuf::from("/tmp/picture.bmp"));
        select_image(&window).await;
        assert!(matches!(
            window.events.borrow()[0],
            InboundEvent::ImageSelectionError { .. }
        ));
    }

    #[tokio::test]
    async fn router_replies_to_invokes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.txt");
        let router = HostRouter::new(SplitMode::Horizontal, Theme::Dark);
        router.attach_window(Rc::new(MockWindow::default()));

        let reply = router
            .handle(Envelope::Invoke {
                request_id: 9,
                call: InvokeCall::SaveFile {
                    content: "routed".into(),
                    file_path: path.to_str().map(String::from),
                },
            })
            .await;

        assert_eq!(
            reply,
            Some(HostMessage::Reply {
                request_id: 9,
                reply: InvokeReply::Saved(path.to_str().map(String::from)),
            })
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "routed");
    }

    #[tokio::test]
    async fn router_without_window_fails_invokes() {
        let router: HostRouter<MockWindow> = HostRouter::new(SplitMode::Horizontal, Theme::Dark);
        let reply = router
            .handle(Envelope::Invoke {
                request_id: 1,
                call: InvokeCall::OpenFile,
            })
            .await;
        assert_eq!(
            reply,
            Some(HostMessage::Reply {
                request_id: 1,
                reply: InvokeReply::Failed("invalid window reference".into()),
            })
        );
    }

    #[tokio::test]
    async fn router_treats_closed_window_as_missing() {
        let router = HostRouter::new(SplitMode::Horizontal, Theme::Dark);
        let window = Rc::new(MockWindow::default());
        router.attach_window(window.clone());
        window.closed.set(true);

        assert!(router.window().is_none());
        let reply = router
            .handle(Envelope::Invoke {
                request_id: 4,
                call: InvokeCall::OpenFile,
            })
            .await;
        assert!(matches!(
            reply,
            Some(HostMessage::Reply {
                reply: InvokeReply::Failed(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn router_rebroadcasts_fire_and_forget_messages() {
        let router = HostRouter::new(SplitMode::Horizontal, Theme::Dark);
        let window = Rc::new(MockWindow::default());
        router.attach_window(window.clone());

        for message in [
            OutboundMessage::NewFile,
            OutboundMessage::ResetImage,
            OutboundMessage::UpdateSplitMode {
                mode: SplitMode::Vertical,
            },
        ] {
            assert_eq!(router.handle(Envelope::Send { message }).await, None);
        }

        assert_eq!(router.split_mode(), SplitMode::Vertical);
        assert_eq!(
            *window.events.borrow(),
            vec![
                InboundEvent::NewFile,
                InboundEvent::ResetImage,
                InboundEvent::SplitModeChange {
                    mode: SplitMode::Vertical
                },
            ]
        );
    }

    #[test]
    fn menu_entry_points_emit_events() {
        let router = HostRouter::new(SplitMode::Horizontal, Theme::Dark);
        let window = Rc::new(MockWindow::default());
        router.attach_window(window.clone());

        router.request_new();
        router.request_open();
        router.request_save();
        router.set_theme(Theme::Light);
        router.toggle_split_mode();
        router.reset_image();

        assert_eq!(router.theme(), Theme::Light);
        assert_eq!(
            *window.events.borrow(),
            vec![
                InboundEvent::NewFile,
                InboundEvent::OpenFile,
                InboundEvent::SaveFile,
                InboundEvent::ThemeChange { theme: Theme::Light },
                InboundEvent::SplitModeChange {
                    mode: SplitMode::Vertical
                },
                InboundEvent::ResetImage,
            ]
        );
    }

    #[test]
    fn detached_router_drops_events() {
        let router = HostRouter::new(SplitMode::Horizontal, Theme::Dark);
        let window = Rc::new(MockWindow::default());
        router.attach_window(window.clone());
        assert!(router.detach_window().is_some());
        router.request_save();
        assert!(window.events.borrow().is_empty());
    }
}
