//! Syntax highlighting module
//!
//! Tree-sitter based highlighting for code blocks:
//! - Language identifiers and the configured allow-list
//! - Per-language parsers and highlight queries
//! - Allow-list-restricted auto-detection for untagged blocks

mod detect;
mod highlights;
mod languages;
mod parser;

pub use detect::detect;
pub use highlights::{
    css_class, highlight_id_for_name, HighlightId, HighlightSpan, HIGHLIGHT_NAMES,
};
pub use languages::{AllowList, LanguageId, ALL_LANGUAGES};
pub use parser::Highlighter;
