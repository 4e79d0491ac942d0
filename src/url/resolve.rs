use url::Url;

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use icd_harvest::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://www.icd10data.com").unwrap();
/// assert_eq!(
///     resolve_link("/ICD10CM/Codes/O00-O9A/O00-O08/O00-/O00.0", &base).as_deref(),
///     Some("https://www.icd10data.com/ICD10CM/Codes/O00-O9A/O00-O08/O00-/O00.0")
/// );
/// assert_eq!(resolve_link("mailto:someone@example.com", &base), None);
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
