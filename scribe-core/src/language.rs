use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Syntax-highlighting language understood by the editor widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Html,
    Css,
    Json,
    Markdown,
    Mermaid,
    Python,
    Java,
    C,
    Cpp,
    Csharp,
    Go,
    Rust,
    Php,
    Ruby,
    Shell,
    Sql,
    Xml,
    Yaml,
    /// Also the landing spot for tags this build does not know.
    #[default]
    #[serde(other)]
    Plaintext,
}

impl Language {
    /// Map a bare extension (no leading dot, any case) to a language.
    pub fn from_extension(ext: &str) -> Language {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "jsx" => Language::Javascript,
            "ts" | "tsx" => Language::Typescript,
            "html" | "htm" => Language::Html,
            "css" => Language::Css,
            "json" => Language::Json,
            "md" | "markdown" => Language::Markdown,
            "mmd" | "mermaid" => Language::Mermaid,
            "py" => Language::Python,
            "java" => Language::Java,
            "c" => Language::C,
            "cpp" => Language::Cpp,
            "cs" => Language::Csharp,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "sh" => Language::Shell,
            "sql" => Language::Sql,
            "xml" => Language::Xml,
            "yaml" | "yml" => Language::Yaml,
            _ => Language::Plaintext,
        }
    }

    /// Infer the language from a file name or path. Total: anything without a
    /// recognised extension is plaintext.
    pub fn from_path(path: &str) -> Language {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(Language::from_extension)
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Plaintext => "plaintext",
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Html => "html",
            Language::Css => "css",
            Language::Json => "json",
            Language::Markdown => "markdown",
            Language::Mermaid => "mermaid",
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Csharp => "csharp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Shell => "shell",
            Language::Sql => "sql",
            Language::Xml => "xml",
            Language::Yaml => "yaml",
        }
    }

    /// Whether documents in this language get a live preview pane.
    pub fn has_preview(self) -> bool {
        matches!(
            self,
            Language::Html | Language::Markdown | Language::Mermaid
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
