//! Field extraction from catalog code pages
//!
//! Every function here is a pure function of the parsed page: calling it
//! twice on the same document yields the same result. Missing or malformed
//! markup yields empty values, never errors, so a section that is absent
//! from the page and one the heuristics cannot read look the same.

use scraper::{ElementRef, Html, Selector};

/// Main document area, excluding navigation and chrome
pub const CONTENT_REGION: &str = "div.body-content";

/// Breadcrumb-like list of the code's ancestors and itself
pub const HIERARCHY_LIST: &str = "ul.codeHierarchy";

const DESCRIPTION_HEADING: &str = "h2.codeDescription";
const PAGE_HEADING: &str = "h1.pageHeading";

/// Elements that may carry a section label
const SECTION_HEADINGS: &str = "span, strong, h3";

/// Labeled annotation lists found on code pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    ClinicalInformation,
    ApplicableTo,
    ApproximateSynonyms,
}

impl Section {
    /// All sections, in serialization order
    pub const ALL: [Section; 3] = [
        Section::ClinicalInformation,
        Section::ApplicableTo,
        Section::ApproximateSynonyms,
    ];

    /// Lower-case label searched for in heading text
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClinicalInformation => "clinical information",
            Self::ApplicableTo => "applicable to",
            Self::ApproximateSynonyms => "approximate synonyms",
        }
    }
}

/// Everything extracted from one code page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeFields {
    pub description: String,
    pub clinical_information: Vec<String>,
    pub applicable_to: Vec<String>,
    pub approximate_synonyms: Vec<String>,
}

/// Extracts the description and the three sections for `code`
pub fn extract_fields(document: &Html, code: &str) -> CodeFields {
    CodeFields {
        description: extract_description(document, code),
        clinical_information: extract_section(document, Section::ClinicalInformation),
        applicable_to: extract_section(document, Section::ApplicableTo),
        approximate_synonyms: extract_section(document, Section::ApproximateSynonyms),
    }
}

/// Normalizes extracted text
///
/// Non-breaking spaces and line breaks become spaces, whitespace runs
/// collapse to a single space, and both ends are trimmed.
///
/// # Examples
///
/// ```
/// use icd_harvest::crawler::normalize_text;
///
/// assert_eq!(normalize_text("  Ectopic\u{a0}pregnancy\r\n  NOS "), "Ectopic pregnancy NOS");
/// ```
pub fn normalize_text(raw: &str) -> String {
    raw.replace(['\u{a0}', '\r', '\n'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized text content of an element and its descendants
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// First whitespace-delimited token of a normalized text
pub fn first_token(text: &str) -> Option<&str> {
    text.split(' ').next().filter(|token| !token.is_empty())
}

/// The page's content region, if present
pub fn content_region(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse(CONTENT_REGION).ok()?;
    document.select(&selector).next()
}

/// Extracts the description of `code`
///
/// Sources are tried in order; the first one present on the page wins:
/// 1. The first hierarchy entry starting with `code`, minus that prefix
/// 2. The description heading, with `code` removed
/// 3. The page heading, with `code` removed
/// 4. The empty string
pub fn extract_description(document: &Html, code: &str) -> String {
    if let Some(description) = description_from_hierarchy(document, code) {
        return description;
    }

    for heading in [DESCRIPTION_HEADING, PAGE_HEADING] {
        let Ok(selector) = Selector::parse(heading) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            return strip_code(&element.text().collect::<String>(), code);
        }
    }

    String::new()
}

fn description_from_hierarchy(document: &Html, code: &str) -> Option<String> {
    let list_selector = Selector::parse(HIERARCHY_LIST).ok()?;
    let item_selector = Selector::parse("li").ok()?;
    let list = document.select(&list_selector).next()?;

    list.select(&item_selector).find_map(|item| {
        element_text(item)
            .strip_prefix(code)
            .map(normalize_text)
    })
}

/// Removes every occurrence of `code`, then trims whitespace and hyphens
fn strip_code(raw: &str, code: &str) -> String {
    let without_code = normalize_text(&raw.replace(code, ""));
    normalize_text(without_code.trim_matches(|c: char| c == ' ' || c == '-'))
}

/// Extracts the items of a labeled section
///
/// The first `span`, `strong` or `h3` whose text contains the label is the
/// heading; the first `ul` after it in document order holds the items.
pub fn extract_section(document: &Html, section: Section) -> Vec<String> {
    let Some(heading) = find_heading(document, section.label()) else {
        return Vec::new();
    };

    let Some(list) = next_list_after(document, heading) else {
        return Vec::new();
    };

    let Ok(item_selector) = Selector::parse("li") else {
        return Vec::new();
    };

    list.select(&item_selector).map(element_text).collect()
}

fn find_heading<'a>(document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(SECTION_HEADINGS).ok()?;
    document
        .select(&selector)
        .find(|element| element_text(*element).to_lowercase().contains(label))
}

/// First `ul` that starts after `anchor` in document order
///
/// Lists nested inside the anchor count, since they start after it.
fn next_list_after<'a>(document: &'a Html, anchor: ElementRef<'a>) -> Option<ElementRef<'a>> {
    document
        .tree
        .root()
        .descendants()
        .skip_while(|node| node.id() != anchor.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "ul")
}
