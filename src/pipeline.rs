//! The highlight pass over a site
//!
//! One-shot sequence: build the validated run options first (configure),
//! then walk the pages and rewrite them (run). There is no watch mode and
//! no re-entry; re-running after a site rebuild is safe because processed
//! blocks carry the idempotency marker.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::SiteConfig;
use crate::page::{rewrite_page, PageStats, RewriteOptions};
use crate::syntax::Highlighter;

/// Totals for a whole run, printed (or serialized) at the end
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub pages_scanned: usize,
    pub pages_changed: usize,
    pub blocks_highlighted: usize,
    pub blocks_skipped: usize,
    pub blocks_unrecognized: usize,
}

impl Summary {
    fn absorb(&mut self, stats: PageStats) {
        self.blocks_highlighted += stats.highlighted;
        self.blocks_skipped += stats.skipped;
        self.blocks_unrecognized += stats.unrecognized;
    }
}

/// A configured highlight pass.
///
/// Construction does all the up-front work (allow-list validation, parser
/// and query initialization); `run` only touches pages. That ordering is
/// the contract: configuration strictly precedes highlighting.
pub struct Pipeline {
    highlighter: Highlighter,
    options: RewriteOptions,
}

impl Pipeline {
    /// Validate config and initialize every grammar
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let allow_list = config.allow_list()?;
        if allow_list.is_empty() {
            tracing::warn!("Allow-list is empty; only explicitly tagged blocks would match, and none are eligible");
        }
        Ok(Self {
            highlighter: Highlighter::new(),
            options: RewriteOptions {
                allow_list,
                class_prefix: config.class_prefix.clone(),
                detect: config.detect,
            },
        })
    }

    /// Highlight every page under `paths`.
    ///
    /// With `check` set, pages are processed but never written; the summary
    /// still counts what would change.
    pub fn run(&mut self, paths: &[PathBuf], check: bool) -> Result<Summary> {
        let pages = collect_pages(paths)?;
        tracing::info!("Processing {} page(s)", pages.len());

        let mut summary = Summary::default();
        for path in &pages {
            let page = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let mut stats = PageStats::default();
            let rewritten = rewrite_page(&mut self.highlighter, &page, &self.options, &mut stats);
            summary.pages_scanned += 1;
            summary.absorb(stats);

            if let Some(rewritten) = rewritten {
                summary.pages_changed += 1;
                if check {
                    tracing::info!("Would update {}", path.display());
                } else {
                    fs::write(path, rewritten)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(
                        "Updated {} ({} block(s))",
                        path.display(),
                        stats.highlighted
                    );
                }
            } else {
                tracing::debug!("Unchanged: {}", path.display());
            }
        }

        Ok(summary)
    }
}

/// Gather the HTML pages under the given paths, sorted for deterministic
/// runs. Explicit file arguments are taken as-is; directories are walked
/// recursively for `.html`/`.htm` files.
fn collect_pages(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for path in paths {
        if path.is_dir() {
            collect_dir(path, &mut pages)
                .with_context(|| format!("Failed to scan {}", path.display()))?;
        } else if path.is_file() {
            pages.push(path.clone());
        } else {
            anyhow::bail!("No such file or directory: {}", path.display());
        }
    }
    pages.sort();
    pages.dedup();
    Ok(pages)
}

fn collect_dir(dir: &Path, pages: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_dir(&path, pages)?;
        } else if is_html(&path) {
            pages.push(path);
        }
    }
    Ok(())
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ext == "html" || ext == "htm"
        })
        .unwrap_or(false)
}
