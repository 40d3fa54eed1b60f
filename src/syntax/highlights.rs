//! Syntax highlighting data structures
//!
//! Defines the capture-name table, byte-span tokens, and the mapping from
//! capture names to CSS class names.

/// Standard tree-sitter capture names mapped to CSS classes.
/// Index into this array is the HighlightId.
pub const HIGHLIGHT_NAMES: &[&str] = &[
    "attribute",             // @attribute
    "boolean",               // @boolean (true, false)
    "comment",               // @comment
    "constant",              // @constant
    "constant.builtin",      // @constant.builtin (null, None)
    "constructor",           // @constructor
    "escape",                // @escape (string escapes)
    "function",              // @function
    "function.builtin",      // @function.builtin (print, echo)
    "function.method",       // @function.method
    "keyword",               // @keyword
    "keyword.function",      // @keyword.function (function, def, fn)
    "keyword.operator",      // @keyword.operator (and, or, not)
    "keyword.return",        // @keyword.return
    "label",                 // @label
    "number",                // @number
    "operator",              // @operator
    "output",                // console output lines (pycon)
    "prompt",                // interpreter prompts (>>> and ...)
    "property",              // @property
    "punctuation",           // @punctuation (general)
    "punctuation.bracket",   // @punctuation.bracket
    "punctuation.delimiter", // @punctuation.delimiter
    "punctuation.special",   // @punctuation.special
    "string",                // @string
    "string.special",        // @string.special (regex, heredoc)
    "tag",                   // @tag (HTML tags)
    "tag.attribute",         // @tag.attribute
    "type",                  // @type
    "type.builtin",          // @type.builtin (int, str, bool)
    "variable",              // @variable
    "variable.builtin",      // @variable.builtin (self, this)
    "variable.parameter",    // @variable.parameter
];

/// Index into HIGHLIGHT_NAMES
pub type HighlightId = u16;

/// A single highlighted byte span within a snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Index into HIGHLIGHT_NAMES
    pub highlight: HighlightId,
}

/// Look up highlight ID by capture name
pub fn highlight_id_for_name(name: &str) -> Option<HighlightId> {
    // Handle hierarchical names: try exact match first, then progressively
    // shorter parents (e.g. "keyword.control.import" -> "keyword.control"
    // -> "keyword").
    let mut current = name;
    loop {
        if let Some(pos) = HIGHLIGHT_NAMES.iter().position(|&n| n == current) {
            return Some(pos as HighlightId);
        }

        let Some(dot_pos) = current.rfind('.') else {
            break;
        };
        current = &current[..dot_pos];
    }

    None
}

/// CSS class name for a highlight ID, e.g. `hl-keyword-return`.
/// Dots become dashes so the class is a single selector token.
pub fn css_class(prefix: &str, id: HighlightId) -> String {
    let name = HIGHLIGHT_NAMES.get(id as usize).copied().unwrap_or("text");
    let mut class = String::with_capacity(prefix.len() + name.len());
    class.push_str(prefix);
    for c in name.chars() {
        class.push(if c == '.' { '-' } else { c });
    }
    class
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_id_lookup() {
        assert!(highlight_id_for_name("keyword").is_some());
        assert!(highlight_id_for_name("keyword.function").is_some());
        assert!(highlight_id_for_name("string").is_some());
        assert!(highlight_id_for_name("nonexistent").is_none());
    }

    #[test]
    fn test_hierarchical_fallback() {
        // "keyword.control.import" isn't in the table, but "keyword" is
        let id = highlight_id_for_name("keyword.control.import").unwrap();
        assert_eq!(HIGHLIGHT_NAMES[id as usize], "keyword");

        // "string.special" is present, so no fallback to "string"
        let id = highlight_id_for_name("string.special.symbol").unwrap();
        assert_eq!(HIGHLIGHT_NAMES[id as usize], "string.special");
    }

    #[test]
    fn test_css_class_names() {
        let keyword = highlight_id_for_name("keyword").unwrap();
        assert_eq!(css_class("hl-", keyword), "hl-keyword");

        let ret = highlight_id_for_name("keyword.return").unwrap();
        assert_eq!(css_class("hl-", ret), "hl-keyword-return");
    }

    #[test]
    fn test_css_class_out_of_range() {
        assert_eq!(css_class("hl-", u16::MAX), "hl-text");
    }
}
