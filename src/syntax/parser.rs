//! Tree-sitter parser state and highlight rendering
//!
//! Manages parsers and compiled highlight queries per language, and turns
//! code snippets into `<span class="...">`-annotated HTML.

use std::collections::HashMap;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Parser, Query, QueryCursor, Tree};

use super::highlights::{css_class, highlight_id_for_name, HighlightId, HighlightSpan};
use super::languages::LanguageId;
use crate::util::html_escape;

// Highlight queries shipped with the grammar crates
const CSS_HIGHLIGHTS: &str = tree_sitter_css::HIGHLIGHTS_QUERY;
const HTML_HIGHLIGHTS: &str = tree_sitter_html::HIGHLIGHTS_QUERY;
const JAVASCRIPT_HIGHLIGHTS: &str = tree_sitter_javascript::HIGHLIGHT_QUERY;
const PYTHON_HIGHLIGHTS: &str = tree_sitter_python::HIGHLIGHTS_QUERY;
const BASH_HIGHLIGHTS: &str = tree_sitter_bash::HIGHLIGHT_QUERY;
const RUST_HIGHLIGHTS: &str = tree_sitter_rust::HIGHLIGHTS_QUERY;
const JSON_HIGHLIGHTS: &str = tree_sitter_json::HIGHLIGHTS_QUERY;

/// Languages that carry their own grammar (Django and Pycon borrow one)
const GRAMMAR_LANGUAGES: &[LanguageId] = &[
    LanguageId::Css,
    LanguageId::Html,
    LanguageId::JavaScript,
    LanguageId::Python,
    LanguageId::Bash,
    LanguageId::Rust,
    LanguageId::Json,
];

/// The grammar a language is parsed with.
///
/// Django templates are HTML with template tags (the tags pass through
/// unstyled); pycon transcripts are Python once the prompts are stripped.
fn grammar_for(lang: LanguageId) -> LanguageId {
    match lang {
        LanguageId::Django => LanguageId::Html,
        LanguageId::Pycon => LanguageId::Python,
        other => other,
    }
}

/// Parsers and compiled queries, initialized once at startup.
///
/// Tree-sitter parsers are !Sync, so the highlighter lives on the thread
/// that runs the pipeline.
pub struct Highlighter {
    /// Parser instances per grammar
    parsers: HashMap<LanguageId, Parser>,
    /// Compiled highlight queries per grammar
    queries: HashMap<LanguageId, Query>,
}

impl Highlighter {
    /// Create a highlighter with every known grammar initialized
    pub fn new() -> Self {
        let mut state = Self {
            parsers: HashMap::new(),
            queries: HashMap::new(),
        };
        for &lang in GRAMMAR_LANGUAGES {
            state.init_language(lang);
        }
        state
    }

    /// Initialize a grammar's parser and query
    fn init_language(&mut self, lang: LanguageId) {
        let (ts_lang, highlights_scm): (tree_sitter::Language, &str) = match lang {
            LanguageId::Css => (tree_sitter_css::LANGUAGE.into(), CSS_HIGHLIGHTS),
            LanguageId::Html => (tree_sitter_html::LANGUAGE.into(), HTML_HIGHLIGHTS),
            LanguageId::JavaScript => (
                tree_sitter_javascript::LANGUAGE.into(),
                JAVASCRIPT_HIGHLIGHTS,
            ),
            LanguageId::Python => (tree_sitter_python::LANGUAGE.into(), PYTHON_HIGHLIGHTS),
            LanguageId::Bash => (tree_sitter_bash::LANGUAGE.into(), BASH_HIGHLIGHTS),
            LanguageId::Rust => (tree_sitter_rust::LANGUAGE.into(), RUST_HIGHLIGHTS),
            LanguageId::Json => (tree_sitter_json::LANGUAGE.into(), JSON_HIGHLIGHTS),
            // Reuse the Html/Python parsers via grammar_for
            LanguageId::Django | LanguageId::Pycon => return,
        };

        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&ts_lang) {
            tracing::error!("Failed to set language for {:?}: {}", lang, e);
            return;
        }
        self.parsers.insert(lang, parser);

        match Query::new(&ts_lang, highlights_scm) {
            Ok(query) => {
                self.queries.insert(lang, query);
            }
            Err(e) => {
                tracing::error!("Failed to compile query for {:?}: {:?}", lang, e);
            }
        }
    }

    /// Parse a snippet with a language's grammar
    pub fn parse(&mut self, lang: LanguageId, source: &str) -> Option<Tree> {
        let grammar = grammar_for(lang);
        let parser = self.parsers.get_mut(&grammar)?;
        parser.parse(source, None)
    }

    /// Extract highlight spans for a snippet, sorted by start offset.
    /// Overlapping captures resolve later-wins (query files list the more
    /// specific patterns later).
    pub fn highlight(&mut self, lang: LanguageId, source: &str) -> Option<Vec<HighlightSpan>> {
        let paint = self.paint(lang, source)?;
        Some(runs(&paint))
    }

    /// Render a snippet as escaped HTML with highlight spans.
    ///
    /// Returns None when the grammar is unavailable (init failure); the
    /// caller decides whether to leave the block untouched.
    pub fn render_html(
        &mut self,
        lang: LanguageId,
        source: &str,
        class_prefix: &str,
    ) -> Option<String> {
        if lang == LanguageId::Pycon {
            return self.render_transcript(source, class_prefix);
        }

        let paint = self.paint(lang, source)?;
        let mut out = String::with_capacity(source.len() * 2);
        render_painted(source, &paint, 0, source.len(), class_prefix, &mut out);
        Some(out)
    }

    /// Per-byte highlight assignment for a snippet
    fn paint(&mut self, lang: LanguageId, source: &str) -> Option<Vec<Option<HighlightId>>> {
        let grammar = grammar_for(lang);
        let tree = self.parse(lang, source)?;
        let query = self.queries.get(&grammar)?;

        let mut paint: Vec<Option<HighlightId>> = vec![None; source.len()];
        let mut cursor = QueryCursor::new();
        let source_bytes = source.as_bytes();

        let mut captures = cursor.captures(query, tree.root_node(), source_bytes);
        while let Some((query_match, capture_idx)) = captures.next() {
            let capture = &query_match.captures[*capture_idx];
            let capture_name = &query.capture_names()[capture.index as usize];

            let Some(highlight_id) = highlight_id_for_name(capture_name) else {
                continue; // Skip unknown captures
            };

            let node = capture.node;
            let start = node.start_byte().min(paint.len());
            let end = node.end_byte().min(paint.len());
            for slot in &mut paint[start..end] {
                *slot = Some(highlight_id);
            }
        }

        Some(paint)
    }

    /// Render a Python console transcript.
    ///
    /// Consecutive `>>>`/`...` lines are joined and parsed as one Python
    /// snippet so multi-line statements keep their context; prompts come
    /// back as their own spans, output lines pass through escaped.
    fn render_transcript(&mut self, source: &str, class_prefix: &str) -> Option<String> {
        let prompt_id = highlight_id_for_name("prompt")?;
        let output_id = highlight_id_for_name("output")?;
        let prompt_class = css_class(class_prefix, prompt_id);
        let output_class = css_class(class_prefix, output_id);

        let lines: Vec<&str> = source.split('\n').collect();
        let mut out = String::with_capacity(source.len() * 2);
        let mut i = 0;

        while i < lines.len() {
            if split_prompt(lines[i]).is_some() {
                // Collect the input run and highlight it as one snippet
                let run_start = i;
                let mut prompts = Vec::new();
                let mut code_lines = Vec::new();
                while i < lines.len() {
                    let Some((prompt, code)) = split_prompt(lines[i]) else {
                        break;
                    };
                    prompts.push(prompt);
                    code_lines.push(code);
                    i += 1;
                }

                let joined = code_lines.join("\n");
                let paint = self.paint(LanguageId::Python, &joined)?;

                let mut offset = 0;
                for (n, code) in code_lines.iter().enumerate() {
                    if run_start + n > 0 {
                        out.push('\n');
                    }
                    out.push_str("<span class=\"");
                    out.push_str(&prompt_class);
                    out.push_str("\">");
                    out.push_str(&html_escape(prompts[n]));
                    out.push_str("</span>");
                    render_painted(
                        &joined,
                        &paint,
                        offset,
                        offset + code.len(),
                        class_prefix,
                        &mut out,
                    );
                    offset += code.len() + 1; // +1 for the joining newline
                }
            } else {
                if i > 0 {
                    out.push('\n');
                }
                if !lines[i].is_empty() {
                    out.push_str("<span class=\"");
                    out.push_str(&output_class);
                    out.push_str("\">");
                    out.push_str(&html_escape(lines[i]));
                    out.push_str("</span>");
                }
                i += 1;
            }
        }

        Some(out)
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a transcript line into (prompt, code) if it is an input line
fn split_prompt(line: &str) -> Option<(&str, &str)> {
    for marker in [">>> ", "... "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some((marker, rest));
        }
    }
    // Bare prompt with no trailing code
    for marker in [">>>", "..."] {
        if line == marker {
            return Some((marker, ""));
        }
    }
    None
}

/// Collapse a per-byte paint into sorted non-overlapping spans
fn runs(paint: &[Option<HighlightId>]) -> Vec<HighlightSpan> {
    let mut spans = Vec::new();
    let mut i = 0;
    while i < paint.len() {
        let Some(id) = paint[i] else {
            i += 1;
            continue;
        };
        let start = i;
        while i < paint.len() && paint[i] == Some(id) {
            i += 1;
        }
        spans.push(HighlightSpan {
            start,
            end: i,
            highlight: id,
        });
    }
    spans
}

/// Emit the byte range `[start, end)` of `source` as escaped HTML, wrapping
/// painted runs in spans. Run boundaries fall on tree-sitter node edges, so
/// they are always char boundaries.
fn render_painted(
    source: &str,
    paint: &[Option<HighlightId>],
    start: usize,
    end: usize,
    class_prefix: &str,
    out: &mut String,
) {
    let end = end.min(source.len());
    let mut i = start;
    while i < end {
        let current = paint.get(i).copied().flatten();
        let run_start = i;
        while i < end && paint.get(i).copied().flatten() == current {
            i += 1;
        }
        let text = html_escape(&source[run_start..i]);
        match current {
            Some(id) => {
                out.push_str("<span class=\"");
                out.push_str(&css_class(class_prefix, id));
                out.push_str("\">");
                out.push_str(&text);
                out.push_str("</span>");
            }
            None => out.push_str(&text),
        }
    }
}
