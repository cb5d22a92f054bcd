use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Base names that mean "this document has no real path yet".
pub const PLACEHOLDER_NAMES: [&str; 2] = ["untitled", "untitled.txt"];

/// Name pre-filled in the save dialog.
pub const DEFAULT_SAVE_NAME: &str = "untitled";

/// Extension appended to a chosen save path that has none.
pub const DEFAULT_EXTENSION: &str = "txt";

/// Extensions offered by the open dialog's text filter.
pub const OPEN_EXTENSIONS: [&str; 11] = [
    "txt", "md", "mmd", "mermaid", "js", "jsx", "ts", "tsx", "html", "css", "json",
];

#[derive(Debug, Error)]
pub enum FileError {
    #[error("invalid window reference")]
    InvalidWindow,
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },
    #[error("file dialog failed: {0}")]
    Dialog(String),
}

/// A named group of extensions shown in a native file dialog.
/// An extension of `"*"` matches every file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        FileFilter {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn all_files() -> Self {
        FileFilter::new("All Files", &["*"])
    }

    pub fn is_wildcard(&self) -> bool {
        self.extensions.iter().any(|e| e == "*")
    }
}

#[derive(Debug, Clone)]
pub struct OpenDialogOptions {
    pub title: String,
    pub filters: Vec<FileFilter>,
}

impl OpenDialogOptions {
    /// Options for opening a document.
    pub fn documents() -> Self {
        OpenDialogOptions {
            title: "Open File".to_string(),
            filters: vec![
                FileFilter::new("Text Files", &OPEN_EXTENSIONS),
                FileFilter::all_files(),
            ],
        }
    }

    /// Options for picking a background image.
    pub fn images() -> Self {
        OpenDialogOptions {
            title: "Select Image".to_string(),
            filters: vec![FileFilter::new(
                "Images",
                &crate::image::SUPPORTED_IMAGE_EXTENSIONS,
            )],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveDialogOptions {
    pub title: String,
    pub default_dir: Option<PathBuf>,
    pub default_name: String,
    pub filters: Vec<FileFilter>,
}

impl Default for SaveDialogOptions {
    fn default() -> Self {
        SaveDialogOptions {
            title: "Save File".to_string(),
            default_dir: dirs::document_dir().or_else(dirs::home_dir),
            default_name: DEFAULT_SAVE_NAME.to_string(),
            filters: vec![
                FileFilter::all_files(),
                FileFilter::new("Text Files", &[DEFAULT_EXTENSION]),
            ],
        }
    }
}

/// Whether `name` is one of the reserved placeholder base names.
pub fn is_placeholder_name(name: &str) -> bool {
    PLACEHOLDER_NAMES.contains(&name)
}

/// Whether saving to `path` requires the user to pick a location first:
/// no path, an empty path, or a placeholder base name.
pub fn needs_save_dialog(path: Option<&str>) -> bool {
    let path = match path {
        Some(p) if !p.is_empty() => p,
        _ => return true,
    };
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .map(is_placeholder_name)
        .unwrap_or(true)
}

/// Append the default extension to a dialog-chosen path that has none.
pub fn with_default_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(DEFAULT_EXTENSION)
    }
}

/// The path as a wire string. Non-UTF-8 paths are refused, never converted
/// lossily.
pub fn path_to_string(path: &Path) -> Result<String, FileError> {
    path.to_str()
        .map(String::from)
        .ok_or_else(|| FileError::NonUtf8Path {
            path: path.to_path_buf(),
        })
}

/// Read a whole file as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String, FileError> {
    fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `content` to `path`, replacing whatever was there.
pub fn write_text(path: &Path, content: &str) -> Result<(), FileError> {
    fs::write(path, content).map_err(|source| FileError::Write {
        path: path.to_path_buf(),
        source,
    })
}
