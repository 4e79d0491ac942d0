//! URL handling module for icd-harvest
//!
//! This module resolves catalog links against the site base URL and
//! recognizes the path conventions of the catalog (chapter roots, range
//! pages, code pages).

mod matcher;
mod resolve;

use crate::config::{CatalogConfig, ChapterConfig};
use ::url::Url;

// Re-export main functions
pub use matcher::{chapter_path, RangeMatch, RangeMatcher};
pub use resolve::resolve_link;

/// Absolute URL of a chapter root page
///
/// # Examples
///
/// ```
/// use icd_harvest::config::{CatalogConfig, ChapterConfig};
/// use icd_harvest::url::chapter_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.icd10data.com").unwrap();
/// let chapter = ChapterConfig::numeric("T", "S00-T88");
/// let url = chapter_url(&base, &CatalogConfig::default(), &chapter).unwrap();
/// assert_eq!(url.as_str(), "https://www.icd10data.com/ICD10CM/Codes/S00-T88");
/// ```
pub fn chapter_url(
    base_url: &Url,
    catalog: &CatalogConfig,
    chapter: &ChapterConfig,
) -> Result<Url, ::url::ParseError> {
    base_url.join(&format!("{}{}", catalog.code_root, chapter.range))
}

/// Returns true if `href` follows the catalog's code-path convention
pub fn is_code_path(href: &str, catalog: &CatalogConfig) -> bool {
    href.contains(&catalog.code_root)
}
