use std::rc::Rc;

use gtk4::gio;
use gtk4::glib;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use webkit6::prelude::*;

use scribe_editor::protocol::Theme;
use scribe_editor::HostRouter;

use super::context::WindowContext;
use super::host_window::GtkHostWindow;

/// Application menu entries: (detailed action, label, accelerators).
/// The first accelerator is the one shown in the menu.
const MENU_ACTIONS: &[(&str, &str, &[&str])] = &[
    ("win.new", "New", &["<Ctrl>n"]),
    ("win.open", "Open…", &["<Ctrl>o"]),
    ("win.save", "Save", &["<Ctrl>s"]),
    ("win.toggle-split", "Toggle Split Orientation", &["<Ctrl>backslash"]),
    ("win.theme-light", "Light Theme", &[]),
    ("win.theme-dark", "Dark Theme", &[]),
    ("win.zoom-reset", "Actual Size", &["<Ctrl>0"]),
    ("win.zoom-in", "Zoom In", &["<Ctrl>plus", "<Ctrl>equal"]),
    ("win.zoom-out", "Zoom Out", &["<Ctrl>minus"]),
    ("win.fullscreen", "Toggle Fullscreen", &["F11"]),
    ("win.select-image", "Select Background Image…", &[]),
    ("win.reset-image", "Reset Background Image", &[]),
    ("win.about", "About Scribe", &[]),
    ("app.quit", "Quit", &["<Ctrl>q"]),
];

/// Register the `win.*` actions and bind their shortcuts. File and theme
/// entries go through the host router; zoom, fullscreen and about act on
/// the window directly.
pub(super) fn install(ctx: &WindowContext, router: &Rc<HostRouter<GtkHostWindow>>) {
    let window = &ctx.window;
    for &(detailed, _, _) in MENU_ACTIONS {
        let Some(name) = detailed.strip_prefix("win.") else {
            continue;
        };
        let action = gio::SimpleAction::new(name, None);
        let router = router.clone();
        let ctx = ctx.clone();
        action.connect_activate(move |_, _| {
            log::debug!("menu action: {}", name);
            match name {
                "new" => router.request_new(),
                "open" => router.request_open(),
                "save" => router.request_save(),
                "toggle-split" => router.toggle_split_mode(),
                "theme-light" => router.set_theme(Theme::Light),
                "theme-dark" => router.set_theme(Theme::Dark),
                "reset-image" => router.reset_image(),
                "select-image" => {
                    let router = router.clone();
                    glib::spawn_future_local(async move {
                        router.select_image().await;
                    });
                }
                "zoom-in" => {
                    let level = ctx.session.borrow_mut().zoom_in();
                    apply_zoom(&ctx, level);
                }
                "zoom-out" => {
                    let level = ctx.session.borrow_mut().zoom_out();
                    apply_zoom(&ctx, level);
                }
                "zoom-reset" => {
                    let level = ctx.session.borrow_mut().reset_zoom();
                    apply_zoom(&ctx, level);
                }
                "fullscreen" => {
                    if ctx.window.is_fullscreen() {
                        ctx.window.unfullscreen();
                    } else {
                        ctx.window.fullscreen();
                    }
                }
                "about" => show_about(&ctx.window),
                _ => log::warn!("Unhandled action {}", name),
            }
        });
        window.add_action(&action);
    }

    // The editor page swallows key events, so catch accelerators globally
    let shortcut_controller = gtk4::ShortcutController::new();
    shortcut_controller.set_scope(gtk4::ShortcutScope::Global);
    for &(detailed, _, accels) in MENU_ACTIONS {
        for accel in accels {
            let window = window.clone();
            add_shortcut(&shortcut_controller, accel, move || {
                if let Err(e) = window.activate_action(detailed, None) {
                    log::warn!("Failed to activate {}: {}", detailed, e);
                }
            });
        }
    }
    window.add_controller(shortcut_controller);
}

/// Register `app.quit`. Windows are closed rather than the application torn
/// down, so each one still persists its state on the way out.
pub(crate) fn install_app_actions(app: &adw::Application) {
    let quit = gio::SimpleAction::new("quit", None);
    {
        let app = app.clone();
        quit.connect_activate(move |_, _| {
            log::info!("Quit requested");
            for window in app.windows() {
                window.close();
            }
        });
    }
    app.add_action(&quit);
}

fn apply_zoom(ctx: &WindowContext, level: f64) {
    log::debug!("zoom -> {:.0}%", level * 100.0);
    ctx.editor.set_zoom_level(level);
    ctx.preview.set_zoom_level(level);
}

fn show_about(window: &adw::ApplicationWindow) {
    let about = adw::AboutDialog::builder()
        .application_name("Scribe")
        .application_icon("accessories-text-editor")
        .version(env!("CARGO_PKG_VERSION"))
        .comments("A code editor with live Markdown, HTML and Mermaid preview")
        .license_type(gtk4::License::Gpl30Only)
        .build();
    about.present(Some(window));
}

/// The primary menu shown from the header bar.
pub(super) fn menu_model() -> gio::Menu {
    let menu = gio::Menu::new();

    let file = gio::Menu::new();
    let view = gio::Menu::new();
    let zoom = gio::Menu::new();
    let background = gio::Menu::new();
    let app = gio::Menu::new();
    for &(detailed, label, accels) in MENU_ACTIONS {
        let section = match detailed {
            "win.new" | "win.open" | "win.save" => &file,
            "win.zoom-reset" | "win.zoom-in" | "win.zoom-out" | "win.fullscreen" => &zoom,
            "win.select-image" | "win.reset-image" => &background,
            "win.about" | "app.quit" => &app,
            _ => &view,
        };
        let item = gio::MenuItem::new(Some(label), Some(detailed));
        if let Some(accel) = accels.first() {
            item.set_attribute_value("accel", Some(&accel.to_variant()));
        }
        section.append_item(&item);
    }
    for section in [&file, &view, &zoom, &background, &app] {
        menu.append_section(None, section);
    }
    menu
}

fn add_shortcut(controller: &gtk4::ShortcutController, accel: &str, callback: impl Fn() + 'static) {
    let trigger = gtk4::ShortcutTrigger::parse_string(accel);
    let action = gtk4::CallbackAction::new(move |_widget, _args| {
        callback();
        glib::Propagation::Stop
    });
    if let Some(trigger) = trigger {
        let shortcut = gtk4::Shortcut::new(Some(trigger), Some(action));
        controller.add_shortcut(shortcut);
    }
}
