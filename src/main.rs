use anyhow::{Context, Result};
use clap::Parser;

use glint::cli::{CliArgs, Command, MkindexArgs, RunArgs};
use glint::config::SiteConfig;
use glint::page::{extract_card, site_relative_url};
use glint::pipeline::{Pipeline, Summary};
use glint::Highlighter;

fn main() {
    let mut cli = CliArgs::parse();
    glint::tracing::init();

    if let Some(Command::Mkindex(args)) = cli.command.take() {
        if let Err(e) = mkindex(&args) {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
        return;
    }

    let args = cli.into_args();
    match run(&args) {
        Ok(summary) => {
            print_summary(&args, &summary);
            if args.check && summary.pages_changed > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn mkindex(args: &MkindexArgs) -> Result<()> {
    let page = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let url = site_relative_url(&args.path, &args.site_root)?;

    let mut highlighter = Highlighter::new();
    let card = extract_card(&mut highlighter, &page, &url)
        .with_context(|| format!("Failed to index {}", args.path.display()))?;
    println!("{}", card.to_html(args.indent));
    Ok(())
}

fn run(args: &RunArgs) -> Result<Summary> {
    // Configure first, highlight second: the pipeline refuses to exist
    // with an invalid allow-list
    let mut config = SiteConfig::load(args.config.as_deref(), &args.site_root)?;
    if !args.languages.is_empty() {
        config.languages = args.languages.clone();
    }

    let mut pipeline = Pipeline::new(&config)?;
    pipeline.run(&args.paths, args.check)
}

fn print_summary(args: &RunArgs, summary: &Summary) {
    if args.json {
        // Summary is a flat struct; serialization can't fail
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: failed to serialize summary: {}", e),
        }
        return;
    }

    let verb = if args.check { "would change" } else { "changed" };
    println!(
        "{} page(s) scanned, {} {}; {} block(s) highlighted, {} skipped, {} unrecognized",
        summary.pages_scanned,
        summary.pages_changed,
        verb,
        summary.blocks_highlighted,
        summary.blocks_skipped,
        summary.blocks_unrecognized
    );
}
