//! Page scanning and rewriting
//!
//! Finds `<pre><code>` blocks in rendered HTML and splices highlighted
//! markup back in place. Also reads article metadata back out of rendered
//! pages for the index-card command.

mod card;
mod rewrite;
mod scan;

pub use card::{extract_card, site_relative_url, ArticleCard};
pub use rewrite::{
    highlight_page, rewrite_page, PageStats, RewriteOptions, HIGHLIGHTED_MARKER,
};
pub use scan::{find_code_blocks, CodeBlock, LangHint};
