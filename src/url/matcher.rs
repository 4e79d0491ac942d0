use crate::config::{CatalogConfig, ChapterConfig, RangeRule};
use regex::Regex;

/// Which part of a range rule accepted a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMatch {
    /// Two-digit numeric range such as `O00-O08`
    Numeric,
    /// Range carrying the chapter's irregular suffix such as `O94-O9A`
    Suffix,
}

/// Recognizes range-page links for one chapter
///
/// A range link lives directly below the chapter path, e.g. with the chapter
/// path `/ICD10CM/Codes/O00-O9A/`:
///
/// - `/ICD10CM/Codes/O00-O9A/O00-O08/` is a numeric range
/// - `/ICD10CM/Codes/O00-O9A/O94-O9A/` only matches through the `O9A` suffix
/// - `/ICD10CM/Codes/O00-O9A/O00-O08/O00-/O00.0` is a code page, not a range
///
/// # Examples
///
/// ```
/// use icd_harvest::config::{CatalogConfig, ChapterConfig};
/// use icd_harvest::url::RangeMatcher;
///
/// let chapter = ChapterConfig::numeric("Z", "Z00-Z99");
/// let matcher = RangeMatcher::new(&CatalogConfig::default(), &chapter).unwrap();
///
/// assert!(matcher.matches("/ICD10CM/Codes/Z00-Z99/Z00-Z13/"));
/// assert!(!matcher.matches("/ICD10CM/Codes/F01-F99/F01-F09/"));
/// ```
#[derive(Debug, Clone)]
pub struct RangeMatcher {
    chapter_path: String,
    numeric: Regex,
    suffix: Option<String>,
}

impl RangeMatcher {
    /// Builds the matcher for a chapter
    pub fn new(catalog: &CatalogConfig, chapter: &ChapterConfig) -> Result<Self, regex::Error> {
        let letter = regex::escape(&chapter.prefix);
        let numeric = Regex::new(&format!(r"^{letter}\d{{2}}-{letter}\d{{2}}$"))?;

        let suffix = match &chapter.range_rule {
            RangeRule::Numeric => None,
            RangeRule::NumericWithSuffix { suffix } => Some(suffix.clone()),
        };

        Ok(Self {
            chapter_path: chapter_path(catalog, chapter),
            numeric,
            suffix,
        })
    }

    /// The path every range link of this chapter contains
    pub fn chapter_path(&self) -> &str {
        &self.chapter_path
    }

    /// Returns true if `href` points at a range page of this chapter
    pub fn matches(&self, href: &str) -> bool {
        self.match_href(href).is_some()
    }

    /// Returns which part of the rule accepted `href`, if any
    pub fn match_href(&self, href: &str) -> Option<RangeMatch> {
        let segment = self.range_segment(href)?;

        if self.numeric.is_match(segment) {
            return Some(RangeMatch::Numeric);
        }

        match &self.suffix {
            Some(suffix) if segment.contains(suffix.as_str()) => Some(RangeMatch::Suffix),
            _ => None,
        }
    }

    /// The single path segment following the chapter path, if that is all
    /// that follows it
    fn range_segment<'a>(&self, href: &'a str) -> Option<&'a str> {
        let start = href.find(&self.chapter_path)? + self.chapter_path.len();
        let rest = href[start..].trim_end_matches('/');

        if rest.is_empty() || rest.contains('/') {
            None
        } else {
            Some(rest)
        }
    }
}

/// Path of a chapter root page, with a trailing slash
pub fn chapter_path(catalog: &CatalogConfig, chapter: &ChapterConfig) -> String {
    format!("{}{}/", catalog.code_root, chapter.range)
}
