//! Configuration module for icd-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Without a file, [`Config::default`] supplies the built-in chapter
//! table.
//!
//! # Example
//!
//! ```no_run
//! use icd_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Attempts per page: {}", config.fetcher.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CatalogConfig, ChapterConfig, Config, FetcherConfig, OutputConfig, RangeRule};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
