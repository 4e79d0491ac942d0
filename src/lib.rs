//! icd-harvest: a polite catalog harvester
//!
//! This crate crawls a public ICD-10-CM reference site chapter by chapter and
//! turns each chapter into an ordered tree of codes, each carrying its
//! description and the labeled annotation lists found on its page.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
///
/// Fetch failures are deliberately absent here: a page that cannot be fetched
/// is an absence value, never an error.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No range pages discovered for chapter {chapter}")]
    NoRanges { chapter: String },

    #[error("No root codes discovered for chapter {chapter}")]
    NoRootCodes { chapter: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use catalog::CodeNode;
pub use config::Config;
pub use crawler::{CatalogAssembler, Fetcher, TreeBuilder};
