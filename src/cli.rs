//! Command-line argument parsing
//!
//! Supports:
//! - Highlighting files or whole site directories
//! - Overriding the configured language allow-list
//! - Check mode for CI (report changes without writing)
//! - `mkindex`: print the index card for one article page

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Highlight code blocks in static HTML pages
#[derive(Parser, Debug)]
#[command(
    name = "glint",
    version,
    about = "Highlight code blocks in static HTML pages",
    args_conflicts_with_subcommands = true
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// HTML files or site directories to process (default: current dir)
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Config file (default: glint.yaml in the site root)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report pages that would change without writing them
    #[arg(long)]
    pub check: bool,

    /// Override the allow-list (repeatable: -l css -l python)
    #[arg(short = 'l', long = "language", value_name = "LANG")]
    pub languages: Vec<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the index-card HTML for an article page
    Mkindex(MkindexArgs),
}

#[derive(Args, Debug)]
pub struct MkindexArgs {
    /// The article page to summarize
    #[arg(value_name = "PAGE")]
    pub path: PathBuf,

    /// Site root the article URL is made relative to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub site_root: PathBuf,

    /// Indent the emitted card by this many spaces
    #[arg(long, default_value_t = 6)]
    pub indent: usize,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Files and directories to process
    pub paths: Vec<PathBuf>,
    /// The first directory argument, used to locate the site config
    pub site_root: PathBuf,
    pub config: Option<PathBuf>,
    pub check: bool,
    pub languages: Vec<String>,
    pub json: bool,
}

impl CliArgs {
    /// Convert parsed CLI args into run configuration
    pub fn into_args(self) -> RunArgs {
        let paths = if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths
        };

        let site_root = paths
            .iter()
            .find(|p| p.is_dir())
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));

        RunArgs {
            paths,
            site_root,
            config: self.config,
            check: self.check,
            languages: self.languages,
            json: self.json,
        }
    }
}
