//! Article index cards
//!
//! A published article page carries its own metadata: the `<h1>` inside
//! `<main><article>` and a `<time>` element under the `metadata-pubdate`
//! node. The `mkindex` command extracts both and prints the card markup
//! the site index embeds for that article.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tree_sitter::Node;

use crate::syntax::{Highlighter, LanguageId};
use crate::util::{html_escape, html_unescape};

use super::scan::{attributes, tag_name};

/// Metadata extracted from one article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCard {
    pub title: String,
    /// Machine-readable publication date (the `datetime` attribute)
    pub pubdate: String,
    /// Human-readable publication date (the `<time>` element's text)
    pub pubdate_label: String,
    /// Site-relative URL of the article
    pub url: String,
}

impl ArticleCard {
    /// Render the card markup, indented for pasting into the index page
    pub fn to_html(&self, indent: usize) -> String {
        let card = format!(
            "<article>\n  <h2><a href=\"/{}\">{}</a></h2>\n  <p>\n    \
             <small>Published on <time datetime=\"{}\">{}</time></small>\n  </p>\n</article>",
            self.url,
            html_escape(&self.title),
            html_escape(&self.pubdate),
            html_escape(&self.pubdate_label),
        );
        if indent == 0 {
            return card;
        }
        let pad = " ".repeat(indent);
        card.lines()
            .map(|line| format!("{}{}", pad, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Pull the index-card metadata out of an article page.
///
/// The page must carry the article layout: an `<h1>` title inside
/// `<main><article>`, and a `<time datetime="...">` element somewhere under
/// a `metadata-pubdate`-classed node. Anything missing is an error, since a
/// card with holes would corrupt the index.
pub fn extract_card(
    highlighter: &mut Highlighter,
    page: &str,
    url: &str,
) -> Result<ArticleCard> {
    let tree = highlighter
        .parse(LanguageId::Html, page)
        .ok_or_else(|| anyhow!("Failed to parse article page"))?;

    let main = find_element(tree.root_node(), page, "main")
        .ok_or_else(|| anyhow!("Article page has no <main> element"))?;
    let article = find_element(main, page, "article")
        .ok_or_else(|| anyhow!("No <article> inside <main>"))?;

    let h1 = find_element(article, page, "h1")
        .ok_or_else(|| anyhow!("Article has no <h1> title"))?;
    let title = text_content(h1, page);
    if title.is_empty() {
        return Err(anyhow!("Article <h1> title is empty"));
    }

    let pubdate_holder = find_with_class(article, page, "metadata-pubdate")
        .ok_or_else(|| anyhow!("Article has no metadata-pubdate element"))?;
    let time = find_element(pubdate_holder, page, "time")
        .ok_or_else(|| anyhow!("No <time> element under metadata-pubdate"))?;
    let pubdate = element_attr(time, page, "datetime")
        .ok_or_else(|| anyhow!("<time> element is missing its datetime attribute"))?;
    if !is_iso_date(pubdate) {
        return Err(anyhow!(
            "Publication date {:?} is not an ISO date (YYYY-MM-DD)",
            pubdate
        ));
    }
    let pubdate_label = text_content(time, page);
    if pubdate_label.is_empty() {
        return Err(anyhow!("<time> element has no display text"));
    }

    Ok(ArticleCard {
        title,
        pubdate: pubdate.to_string(),
        pubdate_label,
        url: url.to_string(),
    })
}

/// URL of an article relative to the site root, with `/`-joined components
pub fn site_relative_url(page: &Path, site_root: &Path) -> Result<String> {
    let page = page
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", page.display()))?;
    let root = site_root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", site_root.display()))?;
    let relative = page.strip_prefix(&root).with_context(|| {
        format!("{} is not under site root {}", page.display(), root.display())
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// First descendant element with the given tag name, in document order
fn find_element<'t>(scope: Node<'t>, page: &str, name: &str) -> Option<Node<'t>> {
    find_descendant(scope, |node| {
        node.kind() == "element" && tag_name(node, page) == Some(name)
    })
}

/// First descendant element carrying the class token, in document order
fn find_with_class<'t>(scope: Node<'t>, page: &str, token: &str) -> Option<Node<'t>> {
    find_descendant(scope, |node| {
        node.kind() == "element"
            && element_attr(node, page, "class")
                .map(|classes| classes.split_whitespace().any(|t| t == token))
                .unwrap_or(false)
    })
}

fn find_descendant<'t>(
    scope: Node<'t>,
    matches: impl Fn(Node<'t>) -> bool,
) -> Option<Node<'t>> {
    let mut stack = children_in_order(scope);
    while let Some(node) = stack.pop() {
        if matches(node) {
            return Some(node);
        }
        stack.extend(children_in_order(node));
    }
    None
}

/// Children reversed so a stack pops them in document order
fn children_in_order(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let mut children: Vec<Node> = node.children(&mut cursor).collect();
    children.reverse();
    children
}

/// Attribute value from an element's start tag
fn element_attr<'a>(element: Node, page: &'a str, name: &str) -> Option<&'a str> {
    let mut cursor = element.walk();
    let start_tag = element
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), "start_tag" | "self_closing_tag"))?;
    attributes(start_tag, page)
        .into_iter()
        .find(|(attr, _)| *attr == name)
        .map(|(_, value)| value)
}

/// Flattened, entity-decoded text of an element and its descendants.
///
/// The grammar trims whitespace off text nodes, so adjacent pieces are
/// rejoined with a space only when the source had whitespace between them.
fn text_content(element: Node, page: &str) -> String {
    let mut raw = String::new();
    let mut prev_end: Option<usize> = None;

    let mut stack = children_in_order(element);
    while let Some(node) = stack.pop() {
        match node.kind() {
            "text" | "entity" => {
                let range = node.byte_range();
                if let Some(end) = prev_end {
                    let gap = page.get(end..range.start).unwrap_or("");
                    if gap.chars().any(char::is_whitespace) {
                        raw.push(' ');
                    }
                }
                raw.push_str(page.get(range.clone()).unwrap_or(""));
                prev_end = Some(range.end);
            }
            _ => stack.extend(children_in_order(node)),
        }
    }

    html_unescape(raw.trim())
}

/// Shape check for a `YYYY-MM-DD` date string
fn is_iso_date(s: &str) -> bool {
    s.len() == 10
        && s.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
<main>
  <article>
    <h1>Dates &amp; <em>times</em> in Python</h1>
    <p class="metadata-pubdate">
      <small>Published on <time datetime="2024-06-01">June 1, 2024</time></small>
    </p>
    <p>Body text.</p>
  </article>
</main>
</body>
</html>
"#;

    fn extract(page: &str) -> Result<ArticleCard> {
        let mut hl = Highlighter::new();
        extract_card(&mut hl, page, "posts/dates.html")
    }

    #[test]
    fn test_extract_card_fields() {
        let card = extract(ARTICLE_PAGE).unwrap();
        assert_eq!(card.title, "Dates & times in Python");
        assert_eq!(card.pubdate, "2024-06-01");
        assert_eq!(card.pubdate_label, "June 1, 2024");
        assert_eq!(card.url, "posts/dates.html");
    }

    #[test]
    fn test_card_html_escapes_and_indents() {
        let card = extract(ARTICLE_PAGE).unwrap();
        let html = card.to_html(0);
        assert!(html.starts_with("<article>"));
        assert!(html.contains("<a href=\"/posts/dates.html\">Dates &amp; times in Python</a>"));
        assert!(html.contains("<time datetime=\"2024-06-01\">June 1, 2024</time>"));

        let indented = card.to_html(6);
        for line in indented.lines() {
            assert!(line.starts_with("      "), "unindented line: {:?}", line);
        }
    }

    #[test]
    fn test_missing_title_is_an_error() {
        let page = r#"<main><article><p class="metadata-pubdate"><time datetime="2024-06-01">June</time></p></article></main>"#;
        let err = extract(page).unwrap_err();
        assert!(err.to_string().contains("<h1>"), "got: {}", err);
    }

    #[test]
    fn test_missing_pubdate_is_an_error() {
        let page = "<main><article><h1>Title</h1></article></main>";
        let err = extract(page).unwrap_err();
        assert!(err.to_string().contains("metadata-pubdate"), "got: {}", err);
    }

    #[test]
    fn test_malformed_datetime_is_an_error() {
        let page = r#"<main><article><h1>Title</h1>
<p class="metadata-pubdate"><time datetime="June 2024">June 2024</time></p>
</article></main>"#;
        let err = extract(page).unwrap_err();
        assert!(err.to_string().contains("ISO"), "got: {}", err);
    }

    #[test]
    fn test_article_outside_main_is_ignored() {
        let page = r#"<article><h1>Nav teaser</h1></article><main><p>no article</p></main>"#;
        assert!(extract(page).is_err());
    }

    #[test]
    fn test_site_relative_url() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("posts");
        std::fs::create_dir_all(&posts).unwrap();
        let page = posts.join("dates.html");
        std::fs::write(&page, "<main></main>").unwrap();

        let url = site_relative_url(&page, dir.path()).unwrap();
        assert_eq!(url, "posts/dates.html");

        let outside = tempfile::tempdir().unwrap();
        assert!(site_relative_url(&page, outside.path()).is_err());
    }

    #[test]
    fn test_is_iso_date() {
        assert!(is_iso_date("2024-06-01"));
        assert!(!is_iso_date("2024-6-1"));
        assert!(!is_iso_date("01-06-2024x"));
        assert!(!is_iso_date("yesterday"));
    }
}
