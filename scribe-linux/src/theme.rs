use gtk4::gdk;
use libadwaita as adw;

use scribe_editor::protocol::Theme;

/// Chrome colors for one theme.
pub struct ThemeColors {
    pub bg: &'static str,
    pub header_bg: &'static str,
    pub fg: &'static str,
    pub handle: &'static str,
    pub handle_hover: &'static str,
}

pub static DARK: ThemeColors = ThemeColors {
    bg: "#141820",
    header_bg: "#24283b",
    fg: "#a8b5d1",
    handle: "#404040",
    handle_hover: "#505050",
};

pub static LIGHT: ThemeColors = ThemeColors {
    bg: "#ffffff",
    header_bg: "#ffffff",
    fg: "#000000",
    handle: "#e0e0e0",
    handle_hover: "#d0d0d0",
};

pub fn colors(theme: Theme) -> &'static ThemeColors {
    if theme.is_dark() {
        &DARK
    } else {
        &LIGHT
    }
}

pub fn bg_rgba(theme: Theme) -> gdk::RGBA {
    gdk::RGBA::parse(colors(theme).bg).unwrap_or(gdk::RGBA::BLACK)
}

/// Switch libadwaita's color scheme and install the matching stylesheet.
/// Returns the new provider; the caller passes the previous one back in so it
/// can be removed.
pub fn apply(theme: Theme, previous: Option<&gtk4::CssProvider>) -> Option<gtk4::CssProvider> {
    adw::StyleManager::default().set_color_scheme(if theme.is_dark() {
        adw::ColorScheme::ForceDark
    } else {
        adw::ColorScheme::ForceLight
    });

    let Some(display) = gdk::Display::default() else {
        log::warn!("No default display, skipping stylesheet");
        return None;
    };
    if let Some(old) = previous {
        gtk4::style_context_remove_provider_for_display(&display, old);
    }

    let c = colors(theme);
    let css = format!(
        r#"
        window.scribe {{
            background-color: {bg};
            color: {fg};
        }}
        window.scribe headerbar {{
            background-color: {header_bg};
            color: {fg};
        }}
        paned.editor-split > separator {{
            background-color: {handle};
            min-width: 4px;
            min-height: 4px;
        }}
        paned.editor-split > separator:hover {{
            background-color: {handle_hover};
        }}
        "#,
        bg = c.bg,
        fg = c.fg,
        header_bg = c.header_bg,
        handle = c.handle,
        handle_hover = c.handle_hover,
    );

    let provider = gtk4::CssProvider::new();
    provider.load_from_string(&css);
    gtk4::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk4::STYLE_PROVIDER_PRIORITY_USER,
    );
    Some(provider)
}
