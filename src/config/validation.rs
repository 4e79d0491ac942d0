use crate::config::types::{CatalogConfig, ChapterConfig, Config, FetcherConfig, RangeRule};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_catalog_config(&config.catalog)?;
    validate_chapters(&config.chapters)?;
    Ok(())
}

/// Validates the fetch policy
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates the shared site layout
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if !config.code_root.starts_with('/') || !config.code_root.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "code-root must start and end with '/', got '{}'",
            config.code_root
        )));
    }
    Ok(())
}

/// Validates the chapter table
fn validate_chapters(chapters: &[ChapterConfig]) -> Result<(), ConfigError> {
    if chapters.is_empty() {
        return Err(ConfigError::Validation(
            "at least one chapter must be configured".to_string(),
        ));
    }

    let mut prefixes = HashSet::new();
    let mut outputs = HashSet::new();

    for chapter in chapters {
        validate_chapter(chapter)?;

        if !prefixes.insert(chapter.prefix.as_str()) {
            return Err(ConfigError::Validation(format!(
                "chapter '{}' is configured twice",
                chapter.prefix
            )));
        }

        if !outputs.insert(chapter.output.as_str()) {
            return Err(ConfigError::Validation(format!(
                "output '{}' is used by more than one chapter",
                chapter.output
            )));
        }
    }

    Ok(())
}

/// Validates a single chapter entry
fn validate_chapter(chapter: &ChapterConfig) -> Result<(), ConfigError> {
    let mut letters = chapter.prefix.chars();
    match (letters.next(), letters.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => {}
        _ => {
            return Err(ConfigError::Validation(format!(
                "chapter prefix must be a single uppercase letter, got '{}'",
                chapter.prefix
            )))
        }
    }

    if chapter.range.is_empty() || chapter.range.contains('/') {
        return Err(ConfigError::Validation(format!(
            "chapter {} range must be a single path segment, got '{}'",
            chapter.prefix, chapter.range
        )));
    }

    if chapter.output.is_empty()
        || chapter.output.contains('/')
        || chapter.output.contains('\\')
    {
        return Err(ConfigError::Validation(format!(
            "chapter {} output must be a bare file name, got '{}'",
            chapter.prefix, chapter.output
        )));
    }

    if chapter.root_code_length < 2 {
        return Err(ConfigError::Validation(format!(
            "chapter {} root-code-length must be >= 2, got {}",
            chapter.prefix, chapter.root_code_length
        )));
    }

    if let RangeRule::NumericWithSuffix { suffix } = &chapter.range_rule {
        if !suffix.starts_with(&chapter.prefix) || suffix.len() <= chapter.prefix.len() {
            return Err(ConfigError::Validation(format!(
                "chapter {} suffix '{}' must start with the chapter prefix",
                chapter.prefix, suffix
            )));
        }
    }

    Ok(())
}
