//! icd-harvest main entry point
//!
//! This is the command-line interface for the icd-harvest catalog harvester.

use anyhow::{bail, Context};
use clap::Parser;
use icd_harvest::config::{load_config_with_hash, ChapterConfig, Config};
use icd_harvest::crawler::harvest;
use icd_harvest::output::print_statistics;
use icd_harvest::url::{chapter_url, RangeMatcher};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// icd-harvest: a polite ICD-10-CM catalog harvester
///
/// Crawls each configured chapter of the catalog site, one request at a
/// time, and writes every chapter as a JSON tree of codes with their
/// descriptions, clinical information, applicable-to entries and
/// approximate synonyms.
#[derive(Parser, Debug)]
#[command(name = "icd-harvest")]
#[command(version)]
#[command(about = "A polite ICD-10-CM catalog harvester", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (built-in chapter table if omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Only harvest the given chapter letter (repeatable)
    #[arg(long = "chapter", value_name = "LETTER")]
    chapters: Vec<String>,

    /// Directory to write chapter files into (overrides the config)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show what would be harvested without touching the network
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("Using built-in chapter table");
            Config::default()
        }
    };

    let chapters = config.select_chapters(&cli.chapters)?;
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));

    if cli.dry_run {
        return handle_dry_run(&config, &chapters, &output_dir);
    }

    handle_harvest(&config, &chapters, &output_dir, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("icd_harvest=info,warn"),
            1 => EnvFilter::new("icd_harvest=debug,info"),
            2 => EnvFilter::new("icd_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved plan
fn handle_dry_run(
    config: &Config,
    chapters: &[ChapterConfig],
    output_dir: &std::path::Path,
) -> anyhow::Result<()> {
    let base_url = Url::parse(&config.fetcher.base_url)?;

    println!("=== icd-harvest Dry Run ===\n");

    println!("Fetcher:");
    println!("  Base URL: {}", config.fetcher.base_url);
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Attempts per page: {}", config.fetcher.max_attempts);
    println!("  Delay before each attempt: {}ms", config.fetcher.request_delay_ms);
    println!("  Backoff after a failed attempt: {}ms", config.fetcher.retry_backoff_ms);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);

    println!("\nOutput directory: {}", output_dir.display());

    println!("\nChapters ({}):", chapters.len());
    for chapter in chapters {
        let url = chapter_url(&base_url, &config.catalog, chapter)?;
        let matcher = RangeMatcher::new(&config.catalog, chapter)?;
        println!("  - {} from {}", chapter.prefix, url);
        println!("    ranges under: {}", matcher.chapter_path());
        if let Some(suffix) = chapter.suffix() {
            println!("    irregular suffix: {}", suffix);
        }
        println!("    root code length: {}", chapter.root_code_length);
        println!("    output: {}", output_dir.join(&chapter.output).display());
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: &Config,
    chapters: &[ChapterConfig],
    output_dir: &std::path::Path,
    quiet: bool,
) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} chapter(s) into {}",
        chapters.len(),
        output_dir.display()
    );

    let summary = harvest(config, chapters, output_dir).await?;

    if !quiet {
        for report in &summary.completed {
            print_statistics(report);
        }
    }

    if !summary.is_success() {
        let failed: Vec<&str> = summary.failed.iter().map(|(p, _)| p.as_str()).collect();
        bail!(
            "{} of {} chapter(s) failed: {}",
            failed.len(),
            chapters.len(),
            failed.join(", ")
        );
    }

    tracing::info!("Harvest completed successfully");
    Ok(())
}
