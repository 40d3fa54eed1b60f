//! Content-based language detection, restricted to the allow-list
//!
//! Untagged code blocks get their language guessed by parsing the snippet
//! with each allow-listed grammar and scoring the fit by the share of bytes
//! under ERROR/MISSING nodes. The lowest score wins; ties go to the earlier
//! allow-list entry. Grammars outside the allow-list are never considered,
//! which is the whole point: an ambiguous snippet must not be classified as
//! a language the site doesn't use.

use tree_sitter::Node;

use super::languages::{AllowList, LanguageId};
use super::parser::Highlighter;

/// Candidates whose parse tree has more than this share of ERROR/MISSING
/// bytes are rejected outright.
const MAX_ERROR_RATIO: f32 = 0.2;

/// Candidates must get at least this share of bytes captured by their
/// highlight query. Filters out grammars that merely tolerate the input
/// (HTML parses arbitrary prose as one big text node).
const MIN_COVERAGE: f32 = 0.05;

/// Guess the language of a snippet, or None to leave it unhighlighted.
pub fn detect(
    highlighter: &mut Highlighter,
    source: &str,
    allow_list: &AllowList,
) -> Option<LanguageId> {
    if source.trim().is_empty() {
        return None;
    }

    // The borrowed-grammar languages are recognized structurally; scoring
    // them through HTML/Python grammars would shadow their hosts.
    if allow_list.contains(LanguageId::Pycon) && looks_like_transcript(source) {
        return Some(LanguageId::Pycon);
    }
    if allow_list.contains(LanguageId::Django) && has_template_tags(source) {
        return Some(LanguageId::Django);
    }

    let mut best: Option<(LanguageId, f32)> = None;
    for lang in allow_list.iter() {
        if matches!(lang, LanguageId::Pycon | LanguageId::Django) {
            continue;
        }

        let Some(tree) = highlighter.parse(lang, source) else {
            continue;
        };
        let error_ratio = error_bytes(tree.root_node()) as f32 / source.len() as f32;
        if error_ratio > MAX_ERROR_RATIO {
            tracing::trace!(
                "detect: {} rejected, error ratio {:.2}",
                lang.name(),
                error_ratio
            );
            continue;
        }

        let Some(spans) = highlighter.highlight(lang, source) else {
            continue;
        };
        let captured: usize = spans.iter().map(|s| s.end - s.start).sum();
        let coverage = captured as f32 / source.len() as f32;
        tracing::trace!(
            "detect: {} error ratio {:.2}, coverage {:.2}",
            lang.name(),
            error_ratio,
            coverage
        );
        if coverage < MIN_COVERAGE {
            continue;
        }

        // Lowest error score wins. Strictly-lower only, so a tie goes to
        // the earlier allow-list entry.
        let better = match best {
            Some((_, best_ratio)) => error_ratio + f32::EPSILON < best_ratio,
            None => true,
        };
        if better {
            best = Some((lang, error_ratio));
        }
    }

    best.map(|(lang, _)| lang)
}

/// A snippet with interpreter prompts is a console transcript
fn looks_like_transcript(source: &str) -> bool {
    source
        .lines()
        .any(|line| line.starts_with(">>> ") || line == ">>>")
}

/// Template tags mark Django markup apart from plain HTML
fn has_template_tags(source: &str) -> bool {
    source.contains("{%") || source.contains("{{")
}

/// Total bytes covered by ERROR or MISSING nodes
fn error_bytes(root: Node) -> usize {
    if !root.has_error() {
        return 0;
    }

    let mut total = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            // MISSING nodes are zero-width; still count them as misfits
            total += node.byte_range().len().max(1);
            continue;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(idents: &[&str]) -> AllowList {
        let idents: Vec<String> = idents.iter().map(|s| s.to_string()).collect();
        AllowList::parse(&idents).unwrap()
    }

    #[test]
    fn test_detect_python() {
        let mut hl = Highlighter::new();
        let list = AllowList::default();
        let source = "def fib(n):\n    if n < 2:\n        return n\n    return fib(n - 1) + fib(n - 2)\n";
        assert_eq!(detect(&mut hl, source, &list), Some(LanguageId::Python));
    }

    #[test]
    fn test_detect_css() {
        let mut hl = Highlighter::new();
        let list = AllowList::default();
        let source = "body {\n  margin: 0;\n  font-family: sans-serif;\n}\n";
        assert_eq!(detect(&mut hl, source, &list), Some(LanguageId::Css));
    }

    #[test]
    fn test_detect_transcript() {
        let mut hl = Highlighter::new();
        let list = AllowList::default();
        let source = ">>> 1 + 1\n2\n";
        assert_eq!(detect(&mut hl, source, &list), Some(LanguageId::Pycon));
    }

    #[test]
    fn test_detect_django_over_html() {
        let mut hl = Highlighter::new();
        let list = AllowList::default();
        let source = "<ul>\n{% for post in posts %}\n  <li>{{ post.title }}</li>\n{% endfor %}\n</ul>\n";
        assert_eq!(detect(&mut hl, source, &list), Some(LanguageId::Django));
    }

    #[test]
    fn test_detect_tie_breaks_by_allow_list_position() {
        // A block comment parses error-free under both grammars, so the
        // scores tie and the earlier allow-list entry must win
        let mut hl = Highlighter::new();
        let source = "/* reset margins before anything else */\n";
        assert_eq!(
            detect(&mut hl, source, &allow(&["css", "js"])),
            Some(LanguageId::Css)
        );
        assert_eq!(
            detect(&mut hl, source, &allow(&["js", "css"])),
            Some(LanguageId::JavaScript)
        );
    }

    #[test]
    fn test_detect_never_leaves_allow_list() {
        let mut hl = Highlighter::new();
        // Rust is a known grammar but excluded here
        let list = allow(&["css", "html"]);
        let source = "fn main() {\n    println!(\"hello\");\n}\n";
        let result = detect(&mut hl, source, &list);
        assert!(
            result.is_none() || matches!(result, Some(LanguageId::Css | LanguageId::Html)),
            "resolved to excluded grammar: {:?}",
            result
        );
    }

    #[test]
    fn test_detect_html_when_allowed() {
        let mut hl = Highlighter::new();
        let list = allow(&["css", "html"]);
        let source = "<article>\n  <h1>Title</h1>\n  <p>Body text.</p>\n</article>\n";
        assert_eq!(detect(&mut hl, source, &list), Some(LanguageId::Html));
    }

    #[test]
    fn test_detect_prose_stays_unhighlighted() {
        let mut hl = Highlighter::new();
        let list = AllowList::default();
        let source = "Just a few words of plain prose, nothing else.\n";
        assert_eq!(detect(&mut hl, source, &list), None);
    }

    #[test]
    fn test_detect_empty() {
        let mut hl = Highlighter::new();
        let list = AllowList::default();
        assert_eq!(detect(&mut hl, "   \n  ", &list), None);
    }

    #[test]
    fn test_detect_empty_allow_list() {
        let mut hl = Highlighter::new();
        let list = allow(&[]);
        assert_eq!(detect(&mut hl, "def f(): pass", &list), None);
    }
}
