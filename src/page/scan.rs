//! Locating code blocks inside a rendered page
//!
//! Pages are parsed with the HTML grammar; eligible blocks are `<code>`
//! elements sitting directly inside `<pre>`.

use std::ops::Range;

use tree_sitter::Node;

use crate::syntax::{Highlighter, LanguageId};

/// What a block's class attribute says about its language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LangHint {
    /// No language-bearing class token
    None,
    /// Resolved to a known grammar
    Known(LanguageId),
    /// A `language-*`/`lang-*` token naming no known grammar
    Unknown(String),
}

/// A `<pre><code>` block found in a page
#[derive(Debug, Clone)]
pub struct CodeBlock {
    /// Byte range of the content between the start and end tag
    pub inner: Range<usize>,
    /// Byte offset of the `>` closing the start tag (attribute insert point)
    pub start_tag_close: usize,
    /// Language hint from the class attribute
    pub hint: LangHint,
    /// Block opted out via a `nohighlight`/`plain` class
    pub opt_out: bool,
    /// Block already carries the `data-highlighted` marker
    pub already_marked: bool,
    /// Block contains child markup the rewrite cannot preserve
    pub has_markup: bool,
}

/// Find every `<pre><code>` block in a page, in document order.
///
/// Returns an empty list when the page fails to parse; the HTML grammar is
/// error-tolerant, so that effectively never happens for real pages.
pub fn find_code_blocks(highlighter: &mut Highlighter, page: &str) -> Vec<CodeBlock> {
    let Some(tree) = highlighter.parse(LanguageId::Html, page) else {
        tracing::warn!("Page failed to parse; no blocks found");
        return Vec::new();
    };

    let mut blocks = Vec::new();
    // Depth-first in document order
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.kind() == "element" && tag_name(node, page) == Some("pre") {
            collect_pre_children(node, page, &mut blocks);
            // Nested <pre> inside <pre> isn't a thing; don't descend
            continue;
        }
        let mut cursor = node.walk();
        // Reverse so the stack pops children in document order
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    blocks
}

/// Collect `<code>` children of a `<pre>` element
fn collect_pre_children(pre: Node, page: &str, blocks: &mut Vec<CodeBlock>) {
    let mut cursor = pre.walk();
    for child in pre.children(&mut cursor) {
        if child.kind() == "element" && tag_name(child, page) == Some("code") {
            if let Some(block) = inspect_code_element(child, page) {
                blocks.push(block);
            }
        }
    }
}

/// Build a CodeBlock from a `<code>` element, or None if it's malformed
fn inspect_code_element(code: Node, page: &str) -> Option<CodeBlock> {
    let mut start_tag = None;
    let mut end_tag = None;
    let mut has_markup = false;

    let mut cursor = code.walk();
    for child in code.children(&mut cursor) {
        match child.kind() {
            "start_tag" => start_tag = Some(child),
            "end_tag" => end_tag = Some(child),
            // Plain text and entities are the only content we can rewrite
            "text" | "entity" => {}
            _ => has_markup = true,
        }
    }

    let start_tag = start_tag?;
    let end_tag = end_tag?;

    let mut hint = LangHint::None;
    let mut opt_out = false;
    let mut already_marked = false;

    for (name, value) in attributes(start_tag, page) {
        match name {
            "class" => {
                for token in value.split_whitespace() {
                    if matches!(token, "nohighlight" | "plain" | "plaintext") {
                        opt_out = true;
                    } else if hint == LangHint::None {
                        hint = classify_token(token);
                    }
                }
            }
            "data-highlighted" => already_marked = true,
            _ => {}
        }
    }

    Some(CodeBlock {
        inner: start_tag.end_byte()..end_tag.start_byte(),
        start_tag_close: start_tag.end_byte().saturating_sub(1),
        hint,
        opt_out,
        already_marked,
        has_markup,
    })
}

/// Turn one class token into a language hint
fn classify_token(token: &str) -> LangHint {
    if let Some(name) = token
        .strip_prefix("language-")
        .or_else(|| token.strip_prefix("lang-"))
    {
        // An explicit prefix is always a language claim, valid or not
        return match LanguageId::from_token(name) {
            Some(lang) => LangHint::Known(lang),
            None => LangHint::Unknown(name.to_string()),
        };
    }
    // Bare tokens only count when they name a known language; anything
    // else is a styling class
    match LanguageId::from_token(token) {
        Some(lang) => LangHint::Known(lang),
        None => LangHint::None,
    }
}

/// Tag name of an element node, from its start tag
pub(super) fn tag_name<'a>(element: Node, page: &'a str) -> Option<&'a str> {
    let mut cursor = element.walk();
    let start_tag = element
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), "start_tag" | "self_closing_tag"))?;
    let mut tag_cursor = start_tag.walk();
    let name = start_tag
        .children(&mut tag_cursor)
        .find(|c| c.kind() == "tag_name")?;
    page.get(name.byte_range()).map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Attribute (name, value) pairs of a start tag. Valueless attributes
/// yield an empty value.
pub(super) fn attributes<'a>(start_tag: Node, page: &'a str) -> Vec<(&'a str, &'a str)> {
    let mut out = Vec::new();
    let mut cursor = start_tag.walk();
    for child in start_tag.children(&mut cursor) {
        if child.kind() != "attribute" {
            continue;
        }
        let mut name = None;
        let mut value = "";
        let mut attr_cursor = child.walk();
        for part in child.children(&mut attr_cursor) {
            match part.kind() {
                "attribute_name" => name = page.get(part.byte_range()),
                "attribute_value" => value = page.get(part.byte_range()).unwrap_or(""),
                "quoted_attribute_value" => {
                    let mut q_cursor = part.walk();
                    let inner = part
                        .children(&mut q_cursor)
                        .find(|c| c.kind() == "attribute_value");
                    if let Some(inner) = inner {
                        value = page.get(inner.byte_range()).unwrap_or("");
                    }
                }
                _ => {}
            }
        }
        if let Some(name) = name {
            out.push((name, value));
        }
    }
    out
}
