//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - The politeness delay before every attempt
//! - Bounded retries with a fixed backoff
//! - Error classification

use crate::config::FetcherConfig;
use reqwest::{Client, StatusCode};
use scraper::Html;
use std::time::Duration;

/// Result of a single fetch attempt
#[derive(Debug)]
pub enum FetchResult {
    /// The page was fetched with HTTP 200
    Success {
        /// Page body content
        body: String,
    },

    /// The server answered with anything other than 200
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Retry policy applied to every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per page
    pub max_attempts: u32,
    /// Sleep before every attempt
    pub request_delay: Duration,
    /// Sleep after a failed attempt when another one follows
    pub retry_backoff: Duration,
}

impl From<&FetcherConfig> for RetryPolicy {
    fn from(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            request_delay: config.request_delay(),
            retry_backoff: config.retry_backoff(),
        }
    }
}

/// Builds an HTTP client with the configured user agent and timeout
///
/// # Arguments
///
/// * `config` - Fetch policy carrying the user agent and timeout
///
/// # Returns
///
/// * `Ok(Client)` - Client with gzip and brotli decoding enabled
/// * `Err(reqwest::Error)` - The client could not be built
///
/// # Example
///
/// ```no_run
/// use icd_harvest::config::FetcherConfig;
/// use icd_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends one GET request and classifies the outcome
///
/// Only HTTP 200 counts as success; every other status is a failed attempt.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Absolute URL to fetch
///
/// # Returns
///
/// A `FetchResult` for this single attempt; no retry happens here.
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();

            if status != StatusCode::OK {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success { body },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            if e.is_timeout() {
                FetchResult::NetworkError {
                    error: "Request timeout".to_string(),
                }
            } else if e.is_connect() {
                FetchResult::NetworkError {
                    error: "Connection refused".to_string(),
                }
            } else {
                FetchResult::NetworkError {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Page fetcher owning the client and the retry policy
///
/// The configuration is fixed at construction; the fetcher holds no state
/// between calls.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher from the fetch configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            policy: RetryPolicy::from(config),
        })
    }

    /// The retry policy in effect
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches a page body, retrying per the policy
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the page
    ///
    /// # Returns
    ///
    /// * `Some(body)` - The page answered 200 within the allowed attempts
    /// * `None` - Every attempt failed
    ///
    /// # Retry Logic
    ///
    /// | Step | Action |
    /// |------|--------|
    /// | Before every attempt | Sleep `request_delay` |
    /// | HTTP 200 | Return the body |
    /// | Any other status | Failed attempt |
    /// | Timeout / network error | Failed attempt |
    /// | Failed attempt, attempts left | Sleep `retry_backoff`, try again |
    /// | Attempts exhausted | Return `None` |
    pub async fn fetch_body(&self, url: &str) -> Option<String> {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.request_delay).await;

            match fetch_url(&self.client, url).await {
                FetchResult::Success { body } => {
                    tracing::trace!("Fetched {} on attempt {}", url, attempt);
                    return Some(body);
                }
                FetchResult::HttpError { status_code } => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: HTTP {}",
                        attempt,
                        self.policy.max_attempts,
                        url,
                        status_code
                    );
                }
                FetchResult::NetworkError { error } => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.policy.max_attempts,
                        url,
                        error
                    );
                }
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.retry_backoff).await;
            }
        }

        tracing::warn!(
            "Giving up on {} after {} attempts",
            url,
            self.policy.max_attempts
        );
        None
    }

    /// Fetches and parses a page; `None` means the page could not be fetched
    pub async fn fetch_document(&self, url: &str) -> Option<Html> {
        let body = self.fetch_body(url).await?;
        Some(Html::parse_document(&body))
    }
}
