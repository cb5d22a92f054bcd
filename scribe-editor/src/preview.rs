use pulldown_cmark::{Options, Parser};
use serde::{Deserialize, Serialize};

use scribe_core::Language;

use crate::protocol::Theme;

/// Shown when a mermaid document has nothing to draw.
pub const DEFAULT_MERMAID_DIAGRAM: &str =
    "graph TD\n    A[Start] --> B{Is it?}\n    B -- Yes --> C[OK]\n    B -- No --> D[End]";

/// Default location of the mermaid runtime loaded by diagram previews.
pub const MERMAID_JS_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

const DIAGRAM_KEYWORDS: [&str; 9] = [
    "graph",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "erDiagram",
    "flowchart",
    "gantt",
    "pie",
    "journey",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Html,
    Markdown,
    Mermaid,
}

pub fn preview_kind(language: Language) -> Option<PreviewKind> {
    match language {
        Language::Html => Some(PreviewKind::Html),
        Language::Markdown => Some(PreviewKind::Markdown),
        Language::Mermaid => Some(PreviewKind::Mermaid),
        _ => None,
    }
}

/// Colors for rendered previews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewTheme {
    pub bg: String,
    pub fg: String,
    pub link: String,
    pub code_bg: String,
    pub border: String,
    pub blockquote_fg: String,
    pub muted: String,
    pub mermaid_theme: String,
}

impl PreviewTheme {
    pub fn dark() -> Self {
        PreviewTheme {
            bg: "#1E1E1E".into(),
            fg: "#D4D4D4".into(),
            link: "#90caf9".into(),
            code_bg: "#2d2d2d".into(),
            border: "#444".into(),
            blockquote_fg: "#ccc".into(),
            muted: "#858585".into(),
            mermaid_theme: "dark".into(),
        }
    }

    pub fn light() -> Self {
        PreviewTheme {
            bg: "#FFFFFF".into(),
            fg: "#000000".into(),
            link: "#1976d2".into(),
            code_bg: "#f5f5f5".into(),
            border: "#ddd".into(),
            blockquote_fg: "#666".into(),
            muted: "#999".into(),
            mermaid_theme: "default".into(),
        }
    }

    pub fn for_theme(theme: Theme) -> Self {
        if theme.is_dark() {
            PreviewTheme::dark()
        } else {
            PreviewTheme::light()
        }
    }
}

/// Build the standalone document shown in the preview pane, or `None` when
/// the language has no preview.
pub fn render_preview(
    language: Language,
    source: &str,
    theme: Theme,
    mermaid_js: &str,
) -> Option<String> {
    let colors = PreviewTheme::for_theme(theme);
    let doc = match preview_kind(language)? {
        PreviewKind::Html => source.to_string(),
        PreviewKind::Markdown => render_markdown_preview(source, &colors),
        PreviewKind::Mermaid => render_mermaid_preview(source, &colors, mermaid_js),
    };
    Some(doc)
}

pub fn render_markdown_preview(source: &str, theme: &PreviewTheme) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(source, options);
    let mut html_body = String::new();
    pulldown_cmark::html::push_html(&mut html_body, parser);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
body {{
    background: {bg};
    color: {fg};
    font-family: sans-serif;
    font-size: 15px;
    line-height: 1.6;
    padding: 16px 24px;
    margin: 0;
}}
a {{ color: {link}; }}
code {{
    font-family: monospace;
    background: {code_bg};
    padding: 0.15em 0.4em;
    border-radius: 4px;
}}
pre {{
    background: {code_bg};
    padding: 12px 16px;
    border-radius: 4px;
    overflow-x: auto;
}}
pre code {{ background: none; padding: 0; }}
blockquote {{
    border-left: 4px solid {border};
    padding-left: 16px;
    margin: 0.8em 0;
    color: {blockquote_fg};
}}
table {{ border-collapse: collapse; margin: 0.8em 0; }}
th, td {{ border: 1px solid {border}; padding: 6px 12px; }}
th {{ background: {code_bg}; }}
del {{ opacity: 0.6; }}
img {{ max-width: 100%; }}
</style>
</head>
<body>
{body}
</body>
</html>"#,
        bg = theme.bg,
        fg = theme.fg,
        link = theme.link,
        code_bg = theme.code_bg,
        border = theme.border,
        blockquote_fg = theme.blockquote_fg,
        body = html_body,
    )
}

/// Prepare mermaid source for rendering: `//` comment lines are dropped and
/// a bare edge list is treated as a top-down graph. Returns `None` when the
/// document is blank.
pub fn normalize_mermaid(source: &str) -> Option<String> {
    if source.trim().is_empty() {
        return None;
    }
    let body = source
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n");
    let body = body.trim();

    if body.is_empty() {
        return Some(DEFAULT_MERMAID_DIAGRAM.to_string());
    }
    if DIAGRAM_KEYWORDS.iter().any(|k| body.starts_with(k)) {
        Some(body.to_string())
    } else {
        Some(format!("graph TD\n{}", body))
    }
}

pub fn render_mermaid_preview(source: &str, theme: &PreviewTheme, mermaid_js: &str) -> String {
    let body = match normalize_mermaid(source) {
        Some(diagram) => format!(
            "<pre class=\"mermaid\">{}</pre>\n<script src=\"{}\"></script>\n\
             <script>mermaid.initialize({{ startOnLoad: true, theme: '{}', securityLevel: 'strict', fontFamily: 'monospace' }});</script>",
            escape_html(&diagram),
            escape_html(mermaid_js),
            theme.mermaid_theme,
        ),
        None => format!(
            "<div style=\"color: {};\">Enter a Mermaid diagram...</div>",
            theme.muted
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
body {{
    background: {bg};
    color: {fg};
    margin: 0;
    padding: 16px;
    display: flex;
    justify-content: center;
}}
pre.mermaid {{ background: none; font-family: monospace; }}
</style>
</head>
<body>
{body}
</body>
</html>"#,
        bg = theme.bg,
        fg = theme.fg,
        body = body,
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
