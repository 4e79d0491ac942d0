//! Statistics over harvested catalogs

use crate::catalog::CodeNode;
use crate::crawler::ChapterReport;

/// Counts describing a chapter's code trees
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Number of root codes written
    pub roots: usize,

    /// Number of codes in all trees, roots included
    pub total_codes: usize,

    /// Deepest level reached (roots are level 0)
    pub max_depth: usize,

    /// Codes whose description came out empty
    pub empty_descriptions: usize,

    /// Codes with at least one clinical information item
    pub with_clinical_information: usize,

    /// Codes with at least one applicable-to item
    pub with_applicable_to: usize,

    /// Codes with at least one approximate synonym
    pub with_approximate_synonyms: usize,
}

impl CatalogStats {
    /// Computes statistics over a list of root trees
    pub fn from_nodes(nodes: &[CodeNode]) -> Self {
        let mut stats = Self {
            roots: nodes.len(),
            ..Self::default()
        };

        for (node, depth) in nodes.iter().flat_map(CodeNode::walk) {
            stats.total_codes += 1;
            stats.max_depth = stats.max_depth.max(depth);

            if node.description.is_empty() {
                stats.empty_descriptions += 1;
            }
            if !node.clinical_information.is_empty() {
                stats.with_clinical_information += 1;
            }
            if !node.applicable_to.is_empty() {
                stats.with_applicable_to += 1;
            }
            if !node.approximate_synonyms.is_empty() {
                stats.with_approximate_synonyms += 1;
            }
        }

        stats
    }
}

/// Prints a chapter report to stdout
pub fn print_statistics(report: &ChapterReport) {
    let stats = &report.stats;

    println!("=== Chapter {} ===", report.prefix);
    println!("  Output: {}", report.output_path.display());
    println!("  Range pages: {}", report.ranges);
    println!(
        "  Root codes: {} written of {} discovered",
        stats.roots, report.roots
    );
    println!("  Total codes: {}", stats.total_codes);
    println!("  Max depth: {}", stats.max_depth);
    println!("  Empty descriptions: {}", stats.empty_descriptions);
    println!(
        "  With clinical information: {}",
        stats.with_clinical_information
    );
    println!("  With applicable to: {}", stats.with_applicable_to);
    println!(
        "  With approximate synonyms: {}",
        stats.with_approximate_synonyms
    );
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
}
