//! Link discovery on catalog pages
//!
//! Three scans share the same shape: walk the links (or hierarchy entries)
//! of the content region, keep the ones following a path convention, and
//! resolve them against the site base URL.
//! - Child codes below a code page
//! - Range pages below a chapter root
//! - Root codes listed on a range page

use crate::config::{CatalogConfig, ChapterConfig};
use crate::crawler::extract::{content_region, element_text, first_token, HIERARCHY_LIST};
use crate::url::{is_code_path, resolve_link, RangeMatcher, RangeMatch};
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// A code together with the absolute URL of its page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLink {
    pub code: String,
    pub url: String,
}

impl CodeLink {
    pub fn new(code: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            url: url.into(),
        }
    }
}

/// A range page found on a chapter root, with the rule that accepted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDescriptor {
    pub url: String,
    pub matched_by: RangeMatch,
}

/// Finds the child codes linked from the page of `code`
///
/// A link is a child when the first token of its text extends `code`, is
/// strictly longer, contains no hyphen (hyphenated tokens are ranges), and
/// its href follows the code-path convention. The first link for a code
/// wins and discovery order is kept.
pub fn discover_children(
    document: &Html,
    code: &str,
    base_url: &Url,
    catalog: &CatalogConfig,
) -> Vec<CodeLink> {
    let mut children = Vec::new();

    let Some(region) = content_region(document) else {
        return children;
    };
    let Ok(link_selector) = Selector::parse("a[href]") else {
        return children;
    };

    let mut seen = HashSet::new();

    for link in region.select(&link_selector) {
        let text = element_text(link);
        let Some(candidate) = first_token(&text) else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        if !is_child_code(candidate, code) || !is_code_path(href, catalog) {
            continue;
        }

        if seen.contains(candidate) {
            continue;
        }

        if let Some(url) = resolve_link(href, base_url) {
            seen.insert(candidate.to_string());
            children.push(CodeLink::new(candidate, url));
        }
    }

    children
}

/// Returns true if `candidate` is a descendant code of `parent`
///
/// # Examples
///
/// ```
/// use icd_harvest::crawler::is_child_code;
///
/// assert!(is_child_code("A01.1", "A01"));
/// assert!(!is_child_code("A01", "A01"));
/// assert!(!is_child_code("A02", "A01"));
/// assert!(!is_child_code("A01-A09", "A01"));
/// ```
pub fn is_child_code(candidate: &str, parent: &str) -> bool {
    candidate.starts_with(parent) && candidate.len() > parent.len() && !candidate.contains('-')
}

/// Finds the range pages linked from a chapter root page
///
/// Returns the distinct matching URLs, sorted.
pub fn discover_ranges(
    document: &Html,
    matcher: &RangeMatcher,
    base_url: &Url,
) -> Vec<RangeDescriptor> {
    let mut ranges = BTreeMap::new();

    let Some(region) = content_region(document) else {
        return Vec::new();
    };
    let Ok(link_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    for link in region.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(matched_by) = matcher.match_href(href) else {
            continue;
        };
        if let Some(url) = resolve_link(href, base_url) {
            ranges.entry(url).or_insert(matched_by);
        }
    }

    ranges
        .into_iter()
        .map(|(url, matched_by)| RangeDescriptor { url, matched_by })
        .collect()
}

/// Lists the root codes of a range page, in page order
///
/// Roots come from the hierarchy list of the content region. An entry is a
/// root when its first token is a root code of the chapter; it is paired with
/// the URL of the entry's first link, and entries without one are skipped.
pub fn discover_root_codes(
    document: &Html,
    chapter: &ChapterConfig,
    base_url: &Url,
) -> Vec<CodeLink> {
    let mut roots = Vec::new();

    let Some(region) = content_region(document) else {
        return roots;
    };
    let (Ok(list_selector), Ok(item_selector), Ok(link_selector)) = (
        Selector::parse(HIERARCHY_LIST),
        Selector::parse("li"),
        Selector::parse("a[href]"),
    ) else {
        return roots;
    };
    let Some(list) = region.select(&list_selector).next() else {
        return roots;
    };

    for item in list.select(&item_selector) {
        let text = element_text(item);
        let Some(code) = first_token(&text) else {
            continue;
        };
        if !is_root_code(code, chapter) {
            continue;
        }

        let url = item
            .select(&link_selector)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| resolve_link(href, base_url));

        if let Some(url) = url {
            roots.push(CodeLink::new(code, url));
        }
    }

    roots
}

/// Returns true if `code` is a root code of the chapter
///
/// A root code has the chapter's root length, starts with the chapter
/// letter and is numeric after it, or starts with the chapter's irregular
/// suffix (e.g. "O9A").
///
/// # Examples
///
/// ```
/// use icd_harvest::config::ChapterConfig;
/// use icd_harvest::crawler::is_root_code;
///
/// let chapter = ChapterConfig::with_suffix("O", "O00-O9A", "O9A");
/// assert!(is_root_code("O09", &chapter));
/// assert!(is_root_code("O9A", &chapter));
/// assert!(!is_root_code("O09.5", &chapter));
/// assert!(!is_root_code("Z00", &chapter));
/// ```
pub fn is_root_code(code: &str, chapter: &ChapterConfig) -> bool {
    if code.chars().count() != chapter.root_code_length {
        return false;
    }

    let Some(rest) = code.strip_prefix(chapter.prefix.as_str()) else {
        return false;
    };

    if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    chapter
        .suffix()
        .map(|suffix| code.starts_with(suffix))
        .unwrap_or(false)
}

/// Deduplicates root codes by code (first URL wins) and sorts them by code
pub fn sort_root_codes(roots: impl IntoIterator<Item = CodeLink>) -> Vec<CodeLink> {
    let mut by_code = BTreeMap::new();
    for root in roots {
        by_code.entry(root.code).or_insert(root.url);
    }
    by_code
        .into_iter()
        .map(|(code, url)| CodeLink { code, url })
        .collect()
}
