//! Crawler module for catalog harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with a politeness delay and bounded retries
//! - Field extraction from code pages
//! - Child, range and root code discovery
//! - Tree building and chapter assembly
//!
//! Everything runs sequentially: one request is in flight at a time.

mod assembler;
mod builder;
mod discover;
mod extract;
mod fetcher;

pub use assembler::{CatalogAssembler, ChapterReport};
pub use builder::TreeBuilder;
pub use discover::{
    discover_children, discover_ranges, discover_root_codes, is_child_code, is_root_code,
    sort_root_codes, CodeLink, RangeDescriptor,
};
pub use extract::{
    content_region, element_text, extract_description, extract_fields, extract_section,
    first_token, normalize_text, CodeFields, Section,
};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, RetryPolicy};

use crate::config::{ChapterConfig, Config};
use crate::HarvestError;
use std::path::Path;
use url::Url;

/// Result of harvesting a set of chapters
#[derive(Debug, Default)]
pub struct HarvestSummary {
    /// Chapters written successfully, in run order
    pub completed: Vec<ChapterReport>,
    /// Chapters that failed, with their error
    pub failed: Vec<(String, HarvestError)>,
}

impl HarvestSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Harvests the given chapters one after another
///
/// Chapters are independent: a chapter that fails is recorded in the
/// summary and the next one still runs. Only setup failures (client or base
/// URL) abort the whole run.
///
/// # Example
///
/// ```no_run
/// use icd_harvest::config::Config;
/// use icd_harvest::crawler::harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let summary = harvest(&config, &config.chapters, Path::new("out")).await?;
/// println!("{} chapters written", summary.completed.len());
/// # Ok(())
/// # }
/// ```
pub async fn harvest(
    config: &Config,
    chapters: &[ChapterConfig],
    output_dir: &Path,
) -> Result<HarvestSummary, HarvestError> {
    let fetcher = Fetcher::new(&config.fetcher)?;
    let base_url = Url::parse(&config.fetcher.base_url)?;
    let assembler = CatalogAssembler::new(&fetcher, &base_url, &config.catalog);

    let mut summary = HarvestSummary::default();

    for chapter in chapters {
        match assembler.harvest(chapter, &config.output, output_dir).await {
            Ok(report) => summary.completed.push(report),
            Err(e) => {
                tracing::error!("Chapter {} failed: {}", chapter.prefix, e);
                summary.failed.push((chapter.prefix.clone(), e));
            }
        }
    }

    Ok(summary)
}
