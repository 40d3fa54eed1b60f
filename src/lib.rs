//! glint - code block highlighter for static HTML sites
//!
//! Scans rendered pages for `<pre><code>` blocks and rewrites them with
//! tree-sitter-based highlight spans. Automatic language detection is
//! restricted to a configured allow-list so ambiguous snippets never get
//! classified as a language the site doesn't use.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod page;
pub mod pipeline;
pub mod syntax;
pub mod tracing;
pub mod util;

// Re-export commonly used types
pub use config::SiteConfig;
pub use page::{extract_card, highlight_page, ArticleCard, PageStats, RewriteOptions};
pub use pipeline::{Pipeline, Summary};
pub use syntax::{AllowList, Highlighter, LanguageId};
