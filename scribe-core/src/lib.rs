pub mod files;
pub mod image;
pub mod language;
pub mod layout;
pub mod state;

pub use language::Language;
pub use layout::SplitMode;
