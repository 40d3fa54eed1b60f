//! Benchmarks for highlight and detection performance
//!
//! Run with: cargo bench --bench syntax

use glint::page::{highlight_page, RewriteOptions};
use glint::syntax::{detect, AllowList, Highlighter, LanguageId};

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

// ============================================================================
// Sample snippets for different languages
// ============================================================================

const PYTHON_SAMPLE: &str = r#"
from dataclasses import dataclass
from datetime import date


@dataclass
class Article:
    title: str
    pubdate: date

    def as_card(self, indent=0):
        lines = [
            f"<h2>{self.title}</h2>",
            f"<time datetime=\"{self.pubdate.isoformat()}\">",
        ]
        return "\n".join(" " * indent + line for line in lines)


def newest(articles):
    return sorted(articles, key=lambda a: a.pubdate, reverse=True)
"#;

const CSS_SAMPLE: &str = r#"
:root {
    --accent: #3498db;
    --font-size: 16px;
}

body {
    font-family: 'Segoe UI', sans-serif;
    font-size: var(--font-size);
    line-height: 1.6;
}

article pre {
    padding: 1em;
    border-radius: 4px;
    overflow-x: auto;
}

@media (max-width: 768px) {
    article pre {
        padding: 0.5em;
    }
}
"#;

const JS_SAMPLE: &str = r#"
const links = document.querySelectorAll("a[href^='http']");

async function fetchStats(url) {
    const response = await fetch(url);
    const data = await response.json();
    return data.visits ?? 0;
}

links.forEach((link) => {
    link.addEventListener("click", (event) => {
        console.log(`outbound: ${event.target.href}`);
    });
});
"#;

const PYCON_SAMPLE: &str = r#">>> from datetime import date
>>> d = date.fromisoformat("2024-06-01")
>>> d.year
2024
>>> d.strftime("%B")
'June'
"#;

fn sample_page(blocks: usize) -> String {
    let mut page = String::from("<html><body>\n");
    for i in 0..blocks {
        page.push_str("<h2>Snippet ");
        page.push_str(&i.to_string());
        page.push_str("</h2>\n<pre><code class=\"language-python\">def f(n):\n    return n * 2</code></pre>\n");
        page.push_str("<pre><code>body { margin: 0; padding: 0; }</code></pre>\n");
    }
    page.push_str("</body></html>\n");
    page
}

// ============================================================================
// Rendering
// ============================================================================

#[divan::bench(args = ["python", "css", "js", "pycon"])]
fn render_sample(bencher: divan::Bencher, lang: &str) {
    let mut highlighter = Highlighter::new();
    let (source, language) = match lang {
        "python" => (PYTHON_SAMPLE, LanguageId::Python),
        "css" => (CSS_SAMPLE, LanguageId::Css),
        "js" => (JS_SAMPLE, LanguageId::JavaScript),
        "pycon" => (PYCON_SAMPLE, LanguageId::Pycon),
        _ => panic!("Unknown language"),
    };

    bencher.bench_local(|| {
        let html = highlighter.render_html(language, source, "hl-");
        divan::black_box(html)
    });
}

// ============================================================================
// Detection
// ============================================================================

#[divan::bench(args = ["python", "css", "js"])]
fn detect_sample(bencher: divan::Bencher, lang: &str) {
    let mut highlighter = Highlighter::new();
    let allow_list = AllowList::default();
    let source = match lang {
        "python" => PYTHON_SAMPLE,
        "css" => CSS_SAMPLE,
        "js" => JS_SAMPLE,
        _ => panic!("Unknown language"),
    };

    bencher.bench_local(|| {
        let guess = detect(&mut highlighter, source, &allow_list);
        divan::black_box(guess)
    });
}

// ============================================================================
// Whole pages
// ============================================================================

#[divan::bench(args = [1, 10, 50])]
fn rewrite_page_blocks(bencher: divan::Bencher, blocks: usize) {
    let mut highlighter = Highlighter::new();
    let options = RewriteOptions::default();
    let page = sample_page(blocks);

    bencher.bench_local(|| {
        let out = highlight_page(&mut highlighter, &page, &options);
        divan::black_box(out)
    });
}

// ============================================================================
// Initialization
// ============================================================================

#[divan::bench]
fn highlighter_init() {
    let highlighter = Highlighter::new();
    divan::black_box(highlighter);
}
