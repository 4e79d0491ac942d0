use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for icd-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_chapters", rename = "chapter")]
    pub chapters: Vec<ChapterConfig>,
}

fn default_chapters() -> Vec<ChapterConfig> {
    vec![
        ChapterConfig::numeric("F", "F01-F99"),
        ChapterConfig::numeric("I", "I00-I99"),
        ChapterConfig::numeric("M", "M00-M99"),
        ChapterConfig::numeric("N", "N00-N99"),
        ChapterConfig::with_suffix("O", "O00-O9A", "O9A"),
        // T codes live inside the injury chapter
        ChapterConfig::numeric("T", "S00-T88"),
        ChapterConfig::numeric("Z", "Z00-Z99"),
    ]
}

/// HTTP fetch policy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetcherConfig {
    /// Scheme and host every catalog path is resolved against
    pub base_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Total attempts per page before giving up
    pub max_attempts: u32,

    /// Politeness delay before every attempt (milliseconds)
    pub request_delay_ms: u64,

    /// Delay after a failed attempt when another one follows (milliseconds)
    pub retry_backoff_ms: u64,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl FetcherConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.icd10data.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            max_attempts: 3,
            request_delay_ms: 250,
            retry_backoff_ms: 1000,
            timeout_secs: 10,
        }
    }
}

/// Site layout shared by all chapters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CatalogConfig {
    /// Path prefix of every code and range page
    pub code_root: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            code_root: "/ICD10CM/Codes/".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory the per-chapter JSON files are written to
    pub directory: String,

    /// Pretty-print with two-space indentation
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            pretty: true,
        }
    }
}

/// One chapter of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChapterConfig {
    /// Leading letter shared by every code in the chapter
    pub prefix: String,

    /// Chapter range path segment (e.g. "O00-O9A")
    pub range: String,

    /// Output file name
    pub output: String,

    /// Length of a root code (letter included)
    #[serde(default = "default_root_code_length")]
    pub root_code_length: usize,

    /// How range pages are recognized on the chapter root page
    #[serde(default)]
    pub range_rule: RangeRule,
}

fn default_root_code_length() -> usize {
    3
}

impl ChapterConfig {
    /// Builds a chapter with the regular numeric range rule
    pub fn numeric(prefix: &str, range: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            range: range.to_string(),
            output: format!("{}_Applicable_Approximate.json", prefix),
            root_code_length: default_root_code_length(),
            range_rule: RangeRule::Numeric,
        }
    }

    /// Builds a chapter whose last range carries an alphanumeric suffix
    pub fn with_suffix(prefix: &str, range: &str, suffix: &str) -> Self {
        Self {
            range_rule: RangeRule::NumericWithSuffix {
                suffix: suffix.to_string(),
            },
            ..Self::numeric(prefix, range)
        }
    }

    /// The irregular suffix literal, if this chapter has one
    pub fn suffix(&self) -> Option<&str> {
        match &self.range_rule {
            RangeRule::Numeric => None,
            RangeRule::NumericWithSuffix { suffix } => Some(suffix),
        }
    }
}

/// Rule deciding whether a link on a chapter root page points at a range page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RangeRule {
    /// Range segment looks like `<prefix>NN-<prefix>NN`
    #[default]
    Numeric,

    /// Numeric, or the range segment contains the given literal (e.g. "O9A")
    NumericWithSuffix { suffix: String },
}

impl Default for Config {
    /// The built-in table of the seven harvested chapters
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            catalog: CatalogConfig::default(),
            output: OutputConfig::default(),
            chapters: default_chapters(),
        }
    }
}

impl Config {
    /// Returns the chapters whose prefix is listed, in table order
    ///
    /// An empty selection means every chapter. Prefixes are matched
    /// case-insensitively; an unknown prefix is rejected.
    pub fn select_chapters(&self, prefixes: &[String]) -> Result<Vec<ChapterConfig>, ConfigError> {
        if prefixes.is_empty() {
            return Ok(self.chapters.clone());
        }

        for wanted in prefixes {
            if !self
                .chapters
                .iter()
                .any(|c| c.prefix.eq_ignore_ascii_case(wanted))
            {
                return Err(ConfigError::Validation(format!(
                    "Unknown chapter '{}' (configured: {})",
                    wanted,
                    self.chapters
                        .iter()
                        .map(|c| c.prefix.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        }

        Ok(self
            .chapters
            .iter()
            .filter(|c| prefixes.iter().any(|p| c.prefix.eq_ignore_ascii_case(p)))
            .cloned()
            .collect())
    }
}
