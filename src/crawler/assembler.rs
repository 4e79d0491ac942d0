//! Chapter assembly - top-level harvest orchestration
//!
//! For one chapter this module:
//! - Discovers the range pages below the chapter root
//! - Collects, deduplicates and sorts the root codes listed on them
//! - Builds the tree of every root code
//! - Serializes the collected trees

use crate::catalog::CodeNode;
use crate::config::{CatalogConfig, ChapterConfig, OutputConfig};
use crate::crawler::builder::TreeBuilder;
use crate::crawler::discover::{
    discover_ranges, discover_root_codes, sort_root_codes, CodeLink, RangeDescriptor,
};
use crate::crawler::fetcher::Fetcher;
use crate::output::{write_catalog, CatalogStats};
use crate::url::{chapter_url, RangeMatcher};
use crate::HarvestError;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use url::Url;

/// Outcome of a successfully harvested chapter
#[derive(Debug, Clone)]
pub struct ChapterReport {
    /// Chapter prefix letter
    pub prefix: String,
    /// Where the catalog was written
    pub output_path: PathBuf,
    /// Number of range pages discovered
    pub ranges: usize,
    /// Number of distinct root codes discovered
    pub roots: usize,
    /// Statistics over the written trees
    pub stats: CatalogStats,
    /// Wall-clock time spent on the chapter
    pub elapsed: Duration,
}

/// Assembles chapter catalogs from the site
pub struct CatalogAssembler<'a> {
    fetcher: &'a Fetcher,
    base_url: &'a Url,
    catalog: &'a CatalogConfig,
}

impl<'a> CatalogAssembler<'a> {
    pub fn new(fetcher: &'a Fetcher, base_url: &'a Url, catalog: &'a CatalogConfig) -> Self {
        Self {
            fetcher,
            base_url,
            catalog,
        }
    }

    /// Fetches the chapter root and returns its range pages, sorted
    ///
    /// An unreachable chapter root yields no ranges.
    pub async fn discover_ranges(
        &self,
        chapter: &ChapterConfig,
    ) -> Result<Vec<RangeDescriptor>, HarvestError> {
        let root_url = chapter_url(self.base_url, self.catalog, chapter)?;
        let matcher = RangeMatcher::new(self.catalog, chapter)?;

        let Some(document) = self.fetcher.fetch_document(root_url.as_str()).await else {
            tracing::warn!("Chapter root {} could not be fetched", root_url);
            return Ok(Vec::new());
        };

        Ok(discover_ranges(&document, &matcher, self.base_url))
    }

    /// Collects the root codes of all range pages, deduplicated and sorted
    ///
    /// Range pages that cannot be fetched are skipped.
    pub async fn discover_roots(
        &self,
        chapter: &ChapterConfig,
        ranges: &[RangeDescriptor],
    ) -> Vec<CodeLink> {
        let mut roots = Vec::new();

        for range in ranges {
            let Some(document) = self.fetcher.fetch_document(&range.url).await else {
                tracing::warn!("Skipping range page {}: page unavailable", range.url);
                continue;
            };

            let found = discover_root_codes(&document, chapter, self.base_url);
            tracing::debug!("{} root codes on {}", found.len(), range.url);
            roots.extend(found);
        }

        sort_root_codes(roots)
    }

    /// Builds every root tree of a chapter
    ///
    /// Trees are returned in ascending root-code order; roots whose page
    /// cannot be fetched are left out.
    pub async fn assemble(&self, chapter: &ChapterConfig) -> Result<Vec<CodeNode>, HarvestError> {
        let (_, _, nodes) = self.assemble_counted(chapter).await?;
        Ok(nodes)
    }

    async fn assemble_counted(
        &self,
        chapter: &ChapterConfig,
    ) -> Result<(usize, usize, Vec<CodeNode>), HarvestError> {
        let ranges = self.discover_ranges(chapter).await?;
        if ranges.is_empty() {
            return Err(HarvestError::NoRanges {
                chapter: chapter.prefix.clone(),
            });
        }

        tracing::info!(
            "Discovered {} {}-range pages",
            ranges.len(),
            chapter.prefix
        );
        for range in &ranges {
            tracing::info!("  - {} ({:?})", range.url, range.matched_by);
        }

        let roots = self.discover_roots(chapter, &ranges).await;
        if roots.is_empty() {
            return Err(HarvestError::NoRootCodes {
                chapter: chapter.prefix.clone(),
            });
        }

        let builder = TreeBuilder::new(self.fetcher, self.base_url, self.catalog);
        let mut nodes = Vec::with_capacity(roots.len());

        for (index, root) in roots.iter().enumerate() {
            tracing::info!("Root {}/{}: {}", index + 1, roots.len(), root.code);

            match builder.build(&root.url, &root.code).await {
                Some(node) => nodes.push(node),
                None => tracing::warn!("Dropping root {}: page unavailable", root.code),
            }
        }

        Ok((ranges.len(), roots.len(), nodes))
    }

    /// Assembles a chapter and writes it to the output directory
    pub async fn harvest(
        &self,
        chapter: &ChapterConfig,
        output: &OutputConfig,
        directory: &Path,
    ) -> Result<ChapterReport, HarvestError> {
        let start_time = Instant::now();
        tracing::info!(
            "Harvesting chapter {} ({}{})",
            chapter.prefix,
            self.catalog.code_root,
            chapter.range
        );

        let (ranges, roots, nodes) = self.assemble_counted(chapter).await?;

        let output_path = directory.join(&chapter.output);
        write_catalog(&output_path, &nodes, output.pretty)?;
        tracing::info!("Saved {}", output_path.display());

        Ok(ChapterReport {
            prefix: chapter.prefix.clone(),
            output_path,
            ranges,
            roots,
            stats: CatalogStats::from_nodes(&nodes),
            elapsed: start_time.elapsed(),
        })
    }
}
