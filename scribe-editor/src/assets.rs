pub const EDITOR_HTML: &str = include_str!("../web/editor.html");
pub const EDITOR_JS: &str = include_str!("../web/editor.js");

const SCRIPT_SLOT: &str = "<!-- SCRIBE_EDITOR_JS -->";

/// The editor page with its script inlined, ready for `WebView::load_html`.
pub fn editor_document() -> String {
    EDITOR_HTML.replace(SCRIPT_SLOT, &format!("<script>\n{}</script>", EDITOR_JS))
}
