pub(crate) mod actions;
mod context;
mod host_window;
mod layout;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gtk4::glib;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use tokio::sync::mpsc;
use webkit6::prelude::*;

use scribe_core::layout::LayoutEvent;
use scribe_core::state::StateStore;
use scribe_editor::preview::{self, MERMAID_JS_URL};
use scribe_editor::protocol::{
    EditorEvent, Envelope, HostMessage, InboundChannel, InboundEvent, OutboundMessage,
};
use scribe_editor::{Bridge, HostRouter, Session, SessionAction};

use crate::editor_webview;
use context::WindowContext;
use host_window::{ChannelTransport, GtkHostWindow};
use layout::LayoutDriver;

const DEFAULT_WIDTH: i32 = 1200;
const DEFAULT_HEIGHT: i32 = 800;

pub fn build_window(app: &adw::Application) {
    let store = Rc::new(StateStore::default_location());
    let session = match store.load() {
        Some(state) => {
            log::info!("Restored app state from {}", store.path().display());
            Session::from_state(state)
        }
        None => Session::new(),
    };
    let theme = session.theme();
    let split_mode = session.split_mode();
    let preview_visible = session.wants_preview();
    let session = Rc::new(RefCell::new(session));

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Scribe")
        .default_width(DEFAULT_WIDTH)
        .default_height(DEFAULT_HEIGHT)
        .build();
    window.add_css_class("scribe");

    // --- In-process wire: UI side <-> host side ---
    let (to_host, mut from_ui) = mpsc::unbounded_channel::<Envelope>();
    let (to_ui, mut from_host) = mpsc::unbounded_channel::<HostMessage>();

    let router = Rc::new(HostRouter::new(split_mode, theme));
    router.attach_window(Rc::new(GtkHostWindow::new(&window, to_ui.clone())));
    let bridge = Rc::new(Bridge::new(ChannelTransport::new(to_host)));

    // --- Widgets ---
    let main_box = gtk4::Box::new(gtk4::Orientation::Vertical, 0);

    let header = adw::HeaderBar::new();
    let title = adw::WindowTitle::new("Scribe", "");
    header.set_title_widget(Some(&title));

    let new_btn = gtk4::Button::from_icon_name("document-new-symbolic");
    new_btn.set_tooltip_text(Some("New (Ctrl+N)"));
    let open_btn = gtk4::Button::from_icon_name("document-open-symbolic");
    open_btn.set_tooltip_text(Some("Open (Ctrl+O)"));
    let save_btn = gtk4::Button::from_icon_name("document-save-symbolic");
    save_btn.set_tooltip_text(Some("Save (Ctrl+S)"));
    header.pack_start(&new_btn);
    header.pack_start(&open_btn);
    header.pack_start(&save_btn);

    let menu_btn = gtk4::MenuButton::new();
    menu_btn.set_icon_name("open-menu-symbolic");
    menu_btn.set_menu_model(Some(&actions::menu_model()));
    header.pack_end(&menu_btn);

    let split_btn = gtk4::Button::from_icon_name("view-dual-symbolic");
    split_btn.set_tooltip_text(Some("Toggle Split Orientation (Ctrl+\\)"));
    header.pack_end(&split_btn);

    let preview_btn = gtk4::ToggleButton::new();
    preview_btn.set_icon_name("view-reveal-symbolic");
    preview_btn.set_tooltip_text(Some("Toggle Preview"));
    preview_btn.set_active(preview_visible);
    header.pack_end(&preview_btn);

    main_box.append(&header);

    let (editor_tx, mut editor_rx) = mpsc::unbounded_channel::<EditorEvent>();
    let (editor_view, editor) = editor_webview::create_editor(theme, move |_handle, event| {
        if editor_tx.send(event).is_err() {
            log::warn!("Editor event dropped, window is closing");
        }
    });
    let preview_view = editor_webview::create_preview(theme);

    let paned = gtk4::Paned::new(match split_mode {
        scribe_core::SplitMode::Horizontal => gtk4::Orientation::Horizontal,
        scribe_core::SplitMode::Vertical => gtk4::Orientation::Vertical,
    });
    paned.add_css_class("editor-split");
    paned.set_vexpand(true);
    paned.set_start_child(Some(&editor_view));
    paned.set_end_child(Some(&preview_view));
    main_box.append(&paned);

    let toast_overlay = adw::ToastOverlay::new();
    toast_overlay.set_child(Some(&main_box));
    window.set_content(Some(&toast_overlay));

    let layout = LayoutDriver::new(
        split_mode,
        preview_visible,
        paned.clone(),
        preview_view.clone().upcast(),
        editor.clone(),
    );

    let ctx = WindowContext {
        window: window.clone(),
        title,
        toast_overlay,
        preview_btn: preview_btn.clone(),
        editor,
        preview: preview_view,
        layout: layout.clone(),
        session,
        bridge: bridge.clone(),
        css: Rc::new(RefCell::new(None)),
        applied_theme: Rc::new(Cell::new(None)),
    };

    // --- Host side: answer envelopes from the UI ---
    {
        let router = router.clone();
        glib::spawn_future_local(async move {
            while let Some(envelope) = from_ui.recv().await {
                let router = router.clone();
                let to_ui = to_ui.clone();
                glib::spawn_future_local(async move {
                    if let Some(reply) = router.handle(envelope).await {
                        if to_ui.send(reply).is_err() {
                            log::warn!("UI side gone, dropping reply");
                        }
                    }
                });
            }
            log::debug!("Host loop finished");
        });
    }

    // --- UI side: host messages through the bridge ---
    for channel in InboundChannel::ALL {
        let ctx = ctx.clone();
        bridge.on_channel(channel, move |event| handle_inbound(&ctx, event));
    }
    {
        let bridge = bridge.clone();
        glib::spawn_future_local(async move {
            while let Some(message) = from_host.recv().await {
                bridge.receive(message);
            }
        });
    }
    {
        let ctx = ctx.clone();
        glib::spawn_future_local(async move {
            while let Some(event) = editor_rx.recv().await {
                handle_editor_event(&ctx, event);
            }
        });
    }

    // --- Toolbar ---
    {
        let bridge = bridge.clone();
        new_btn.connect_clicked(move |_| bridge.new_file());
    }
    {
        let ctx = ctx.clone();
        open_btn.connect_clicked(move |_| run_open(&ctx));
    }
    {
        let ctx = ctx.clone();
        save_btn.connect_clicked(move |_| run_save(&ctx));
    }
    {
        let ctx = ctx.clone();
        split_btn.connect_clicked(move |_| {
            let mode = ctx.session.borrow().split_mode().toggled();
            ctx.bridge
                .send_message(OutboundMessage::UpdateSplitMode { mode });
        });
    }
    {
        let ctx = ctx.clone();
        preview_btn.connect_toggled(move |btn| {
            let wants = {
                let mut session = ctx.session.borrow_mut();
                if session.preview_visible() != btn.is_active() {
                    session.toggle_preview();
                }
                session.wants_preview()
            };
            ctx.layout.notify(LayoutEvent::PreviewToggled(wants));
            render_preview(&ctx);
        });
    }

    actions::install(&ctx, &router);

    // --- Layout observation ---
    {
        let layout = layout.clone();
        paned.connect_position_notify(move |_| layout.pane_moved());
    }
    {
        let layout = layout.clone();
        window.connect_default_width_notify(move |w| {
            let (width, height) = w.default_size();
            layout.notify(LayoutEvent::WindowResized { width, height });
        });
    }
    {
        let layout = layout.clone();
        window.connect_default_height_notify(move |w| {
            let (width, height) = w.default_size();
            layout.notify(LayoutEvent::WindowResized { width, height });
        });
    }
    {
        let layout = layout.clone();
        window.connect_maximized_notify(move |w| {
            layout.notify(LayoutEvent::WindowResized {
                width: w.width(),
                height: w.height(),
            });
        });
    }

    // --- Shutdown: persist the snapshot, then let go of the window ---
    {
        let ctx = ctx.clone();
        let router = router.clone();
        window.connect_close_request(move |_| {
            let state = ctx.session.borrow().to_state();
            if let Err(e) = store.save(&state) {
                log::error!("Failed to save app state: {}", e);
            }
            router.detach_window();
            ctx.bridge.disconnect();
            glib::Propagation::Proceed
        });
    }

    refresh(&ctx);
    layout.notify(LayoutEvent::WindowResized {
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
    });
    window.present();
}

/// Apply a host event to the session and carry out whatever it asks for.
fn handle_inbound(ctx: &WindowContext, event: &InboundEvent) {
    let action = ctx.session.borrow_mut().apply_event(event);
    match action {
        SessionAction::None => {}
        SessionAction::Refresh => refresh(ctx),
        SessionAction::Relayout => {
            let mode = ctx.session.borrow().split_mode();
            ctx.layout.notify(LayoutEvent::OrientationChanged(mode));
        }
        SessionAction::RunOpen => run_open(ctx),
        SessionAction::RunSave => run_save(ctx),
        SessionAction::ShowError(message) => show_error(ctx, &message),
    }
}

fn handle_editor_event(ctx: &WindowContext, event: EditorEvent) {
    match event {
        EditorEvent::Ready => {
            log::debug!("Editor page ready");
            refresh(ctx);
        }
        EditorEvent::ContentChanged { content, .. } => {
            if ctx.session.borrow_mut().set_content(content) {
                update_title(ctx);
                render_preview(ctx);
            }
        }
        EditorEvent::SaveRequested => run_save(ctx),
        EditorEvent::OpenRequested => run_open(ctx),
        EditorEvent::NewRequested => ctx.bridge.new_file(),
    }
}

fn run_open(ctx: &WindowContext) {
    let pending = ctx.bridge.open_file();
    let ctx = ctx.clone();
    glib::spawn_future_local(async move {
        match pending.await {
            Ok(Some(opened)) => {
                ctx.session.borrow_mut().apply_opened(opened);
                refresh(&ctx);
            }
            Ok(None) => {}
            Err(e) => show_error(&ctx, &format!("Open failed: {}", e)),
        }
    });
}

fn run_save(ctx: &WindowContext) {
    let request = ctx.session.borrow().save_request();
    let pending = ctx.bridge.save_file(request.content, request.file_path);
    let ctx = ctx.clone();
    glib::spawn_future_local(async move {
        match pending.await {
            Ok(Some(path)) => {
                ctx.session.borrow_mut().apply_saved(path);
                refresh(&ctx);
                ctx.toast_overlay
                    .add_toast(adw::Toast::new(&format!("Saved {}", ctx.session.borrow().display_name())));
            }
            Ok(None) => {}
            Err(e) => show_error(&ctx, &format!("Save failed: {}", e)),
        }
    });
}

fn show_error(ctx: &WindowContext, message: &str) {
    log::warn!("{}", message);
    ctx.toast_overlay.add_toast(adw::Toast::new(message));
}

/// Push the whole session to the widgets.
fn refresh(ctx: &WindowContext) {
    let (content, language, theme, background, wants_preview) = {
        let session = ctx.session.borrow();
        (
            session.content().to_string(),
            session.language(),
            session.theme(),
            session.background_image().map(String::from),
            session.wants_preview(),
        )
    };

    if ctx.applied_theme.get() != Some(theme) {
        let previous = ctx.css.borrow_mut().take();
        *ctx.css.borrow_mut() = crate::theme::apply(theme, previous.as_ref());
        ctx.preview
            .set_background_color(&crate::theme::bg_rgba(theme));
        ctx.editor.set_theme(theme);
        ctx.applied_theme.set(Some(theme));
    }

    ctx.editor.set_content(&content, language);
    ctx.editor.set_background_image(background.as_deref());

    ctx.preview_btn.set_sensitive(language.has_preview());
    if ctx.preview_btn.is_active() != wants_preview {
        ctx.preview_btn.set_active(wants_preview);
    }
    ctx.layout.notify(LayoutEvent::PreviewToggled(wants_preview));

    update_title(ctx);
    render_preview(ctx);
}

fn update_title(ctx: &WindowContext) {
    let session = ctx.session.borrow();
    ctx.window.set_title(Some(&session.window_title()));
    let name = if session.is_dirty() {
        format!("*{}", session.display_name())
    } else {
        session.display_name()
    };
    ctx.title.set_title(&name);
    ctx.title.set_subtitle(session.file_path().unwrap_or(""));
}

fn render_preview(ctx: &WindowContext) {
    let session = ctx.session.borrow();
    if !session.wants_preview() {
        return;
    }
    if let Some(doc) = preview::render_preview(
        session.language(),
        session.content(),
        session.theme(),
        MERMAID_JS_URL,
    ) {
        ctx.preview.load_html(&doc, None);
    }
}
