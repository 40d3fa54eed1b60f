//! Rewriting pages with highlighted code blocks
//!
//! Splices rendered spans into the page and marks each processed block with
//! `data-highlighted="yes"` so a second run is a no-op.

use crate::syntax::{detect, AllowList, Highlighter};
use crate::util::html_unescape;

use super::scan::{find_code_blocks, LangHint};

/// The idempotency marker added to each highlighted `<code>` tag
pub const HIGHLIGHTED_MARKER: &str = " data-highlighted=\"yes\"";

/// Per-page outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    /// Blocks rewritten with highlight spans
    pub highlighted: usize,
    /// Blocks deliberately left alone (marker, opt-out, excluded language,
    /// child markup, empty)
    pub skipped: usize,
    /// Blocks glint wanted to highlight but couldn't place a language for
    pub unrecognized: usize,
}

/// Knobs for a highlight pass, fixed for the whole run
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub allow_list: AllowList,
    pub class_prefix: String,
    /// Auto-detect languages for untagged blocks
    pub detect: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            allow_list: AllowList::default(),
            class_prefix: "hl-".to_string(),
            detect: true,
        }
    }
}

/// A single splice into the page text
struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

/// Highlight every eligible block in a page.
///
/// Returns the rewritten page, or None when nothing changed (zero blocks,
/// or every block skipped).
pub fn rewrite_page(
    highlighter: &mut Highlighter,
    page: &str,
    options: &RewriteOptions,
    stats: &mut PageStats,
) -> Option<String> {
    let blocks = find_code_blocks(highlighter, page);
    if blocks.is_empty() {
        return None;
    }

    let mut edits: Vec<Edit> = Vec::new();

    for block in &blocks {
        if block.already_marked || block.opt_out {
            stats.skipped += 1;
            continue;
        }
        if block.has_markup {
            tracing::debug!("Skipping code block with child markup");
            stats.skipped += 1;
            continue;
        }

        let raw = &page[block.inner.clone()];
        let source = html_unescape(raw);
        if source.trim().is_empty() {
            stats.skipped += 1;
            continue;
        }

        let language = match &block.hint {
            LangHint::Known(lang) => {
                if options.allow_list.contains(*lang) {
                    Some(*lang)
                } else {
                    // Known grammar, but the site excluded it
                    tracing::debug!("Skipping block tagged {} (not in allow-list)", lang.name());
                    stats.skipped += 1;
                    continue;
                }
            }
            LangHint::Unknown(name) => {
                tracing::debug!("Unknown language tag {:?}", name);
                stats.unrecognized += 1;
                continue;
            }
            LangHint::None if options.detect => {
                detect(highlighter, &source, &options.allow_list)
            }
            LangHint::None => None,
        };

        let Some(language) = language else {
            stats.unrecognized += 1;
            continue;
        };

        let Some(rendered) = highlighter.render_html(language, &source, &options.class_prefix)
        else {
            tracing::warn!("No grammar available for {}", language.display_name());
            stats.skipped += 1;
            continue;
        };

        tracing::debug!("Highlighted block as {}", language.display_name());
        stats.highlighted += 1;
        edits.push(Edit {
            start: block.start_tag_close,
            end: block.start_tag_close,
            replacement: HIGHLIGHTED_MARKER.to_string(),
        });
        edits.push(Edit {
            start: block.inner.start,
            end: block.inner.end,
            replacement: rendered,
        });
    }

    if edits.is_empty() {
        return None;
    }

    Some(apply_edits(page, edits))
}

/// Apply splices back-to-front so earlier offsets stay valid
fn apply_edits(page: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| std::cmp::Reverse((e.start, e.end)));
    let mut out = page.to_string();
    for edit in edits {
        out.replace_range(edit.start..edit.end, &edit.replacement);
    }
    out
}

/// Convenience used by tests and the pipeline's check mode: one page, one
/// pass, default stats.
pub fn highlight_page(
    highlighter: &mut Highlighter,
    page: &str,
    options: &RewriteOptions,
) -> (Option<String>, PageStats) {
    let mut stats = PageStats::default();
    let rewritten = rewrite_page(highlighter, page, options, &mut stats);
    (rewritten, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(page: &str) -> (Option<String>, PageStats) {
        let mut hl = Highlighter::new();
        highlight_page(&mut hl, page, &RewriteOptions::default())
    }

    #[test]
    fn test_tagged_block_is_highlighted_and_marked() {
        let page = r#"<pre><code class="language-python">def f(): pass</code></pre>"#;
        let (out, stats) = run(page);
        let out = out.expect("page should change");
        assert_eq!(stats.highlighted, 1);
        assert!(out.contains(HIGHLIGHTED_MARKER.trim_start()));
        assert!(out.contains("<span class=\"hl-"));
        assert!(out.contains("</code></pre>"));
    }

    #[test]
    fn test_idempotent_second_run() {
        let page = r#"<pre><code class="language-css">a { color: red; }</code></pre>"#;
        let mut hl = Highlighter::new();
        let options = RewriteOptions::default();

        let (first, stats) = highlight_page(&mut hl, page, &options);
        let first = first.expect("first run should change the page");
        assert_eq!(stats.highlighted, 1);

        let (second, stats) = highlight_page(&mut hl, &first, &options);
        assert_eq!(second, None, "second run must be a no-op");
        assert_eq!(stats.highlighted, 0);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_zero_blocks_unchanged() {
        let page = "<html><body><p>prose only</p></body></html>";
        let (out, stats) = run(page);
        assert_eq!(out, None);
        assert_eq!(stats, PageStats::default());
    }

    #[test]
    fn test_excluded_tag_left_alone() {
        // Rust has a grammar but isn't in the default allow-list
        let page = r#"<pre><code class="language-rust">fn main() {}</code></pre>"#;
        let (out, stats) = run(page);
        assert_eq!(out, None);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.highlighted, 0);
    }

    #[test]
    fn test_untagged_block_detected_within_allow_list() {
        let page = r#"<pre><code>def fib(n):
    if n &lt; 2:
        return n
    return fib(n - 1) + fib(n - 2)</code></pre>"#;
        let (out, stats) = run(page);
        let out = out.expect("python block should be detected");
        assert_eq!(stats.highlighted, 1);
        assert!(out.contains("<span class=\"hl-"));
        // The escaped < must come back escaped
        assert!(out.contains("&lt;"));
    }

    #[test]
    fn test_detection_disabled_leaves_untagged_alone() {
        let page = r#"<pre><code>def f(): pass</code></pre>"#;
        let mut hl = Highlighter::new();
        let options = RewriteOptions {
            detect: false,
            ..RewriteOptions::default()
        };
        let (out, stats) = highlight_page(&mut hl, page, &options);
        assert_eq!(out, None);
        assert_eq!(stats.unrecognized, 1);
    }

    #[test]
    fn test_ambiguous_block_restricted_to_allow_list() {
        // css and html only; the snippet is unambiguous JavaScript. CSS
        // fails to parse it and the HTML grammar captures nothing, so the
        // block must come out untouched and counted as unrecognized.
        let allow = AllowList::parse(&["css".to_string(), "html".to_string()]).unwrap();
        let options = RewriteOptions {
            allow_list: allow,
            ..RewriteOptions::default()
        };
        let page = "<pre><code>const nodes = document.querySelectorAll(\"p\");
for (const node of nodes) {
  node.classList.add(\"ready\");
}</code></pre>";
        let mut hl = Highlighter::new();
        let (out, stats) = highlight_page(&mut hl, page, &options);
        assert_eq!(out, None, "js block resolved inside {{css, html}}");
        assert_eq!(stats.unrecognized, 1);
        assert_eq!(stats.highlighted, 0);
    }

    #[test]
    fn test_scenario_html_tagged_plus_ambiguous() {
        let allow = AllowList::parse(&["css".to_string(), "html".to_string()]).unwrap();
        let options = RewriteOptions {
            allow_list: allow,
            ..RewriteOptions::default()
        };
        let page = concat!(
            r#"<pre><code class="language-html">&lt;p&gt;hi&lt;/p&gt;</code></pre>"#,
            r#"<pre><code>&lt;div class="x"&gt;&lt;/div&gt;</code></pre>"#,
        );
        let mut hl = Highlighter::new();
        let (out, stats) = highlight_page(&mut hl, page, &options);
        let out = out.expect("tagged html block must be highlighted");
        assert!(stats.highlighted >= 1);
        assert!(out.contains("hl-tag"));
    }

    #[test]
    fn test_unknown_tag_counted() {
        let page = r#"<pre><code class="language-cobol">MOVE A TO B.</code></pre>"#;
        let (out, stats) = run(page);
        assert_eq!(out, None);
        assert_eq!(stats.unrecognized, 1);
    }

    #[test]
    fn test_block_with_markup_skipped() {
        let page = r#"<pre><code class="language-python">x = <a href="/doc">1</a></code></pre>"#;
        let (out, stats) = run(page);
        assert_eq!(out, None);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_surrounding_page_untouched() {
        let page = r#"<h1>Post</h1><pre><code class="language-css">a{}</code></pre><footer>end</footer>"#;
        let (out, _) = run(page);
        let out = out.unwrap();
        assert!(out.starts_with("<h1>Post</h1>"));
        assert!(out.ends_with("<footer>end</footer>"));
    }
}
