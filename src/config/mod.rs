//! Configuration management.
//!
//! Every knob is a plain scalar or string with a serde default, so a
//! [`Config`] can be assembled in code or parsed from a TOML document.
//! [`Config::validate`] runs before any network call and rejects values that
//! would make the client or expander misbehave.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of its allowed range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The TOML document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration for one graph-build session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub expand: ExpandConfig,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values before any network call is issued.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.api.per_page == 0 || self.api.per_page > 200 {
            return Err(ConfigError::Invalid(
                "per_page must be between 1 and 200".into(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if !self.retry.backoff_base.is_finite() || self.retry.backoff_base < 0.0 {
            return Err(ConfigError::Invalid(
                "backoff_base must be a non-negative number".into(),
            ));
        }
        if !self.retry.backoff_floor_secs.is_finite() || self.retry.backoff_floor_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "backoff_floor_secs must be a non-negative number".into(),
            ));
        }
        if self.expand.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".into()));
        }
        if !self.expand.hop_delay_secs.is_finite() || self.expand.hop_delay_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "hop_delay_secs must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// Connection settings for the works API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Contact address sent with every request; identifies the caller to the
    /// service's polite pool.
    #[serde(default)]
    pub mailto: Option<String>,

    /// Maximum number of requests in flight across the whole client.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Records per page for paginated listings (service maximum: 200).
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mailto: None,
            concurrency: default_concurrency(),
            per_page: default_per_page(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Retry and backoff policy for single fetch operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Error-retry budget per fetch operation. Rate-limit (429) and
    /// transient-block (403) waits do not count against it.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Exponential backoff multiplier per failed attempt.
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,

    /// Fixed floor added to every backoff delay, in seconds.
    #[serde(default = "default_backoff_floor")]
    pub backoff_floor_secs: f64,

    /// Sleep before retrying a 429 when the server gives no hint.
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay_secs: u64,

    /// Sleep before retrying a 403.
    #[serde(default = "default_blocked_delay")]
    pub blocked_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base: default_backoff_base(),
            backoff_floor_secs: default_backoff_floor(),
            rate_limit_delay_secs: default_rate_limit_delay(),
            blocked_delay_secs: default_blocked_delay(),
        }
    }
}

impl RetryConfig {
    /// Backoff delay after the given number of failures (1-based).
    pub(crate) fn backoff_delay(&self, failures: u32) -> Duration {
        let exp = self
            .backoff_base
            .powi(failures.saturating_sub(1).min(i32::MAX as u32) as i32);
        Duration::from_secs_f64((exp + self.backoff_floor_secs).max(0.0))
    }

    pub(crate) fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_delay_secs)
    }

    pub(crate) fn blocked_delay(&self) -> Duration {
        Duration::from_secs(self.blocked_delay_secs)
    }
}

/// Expansion tuning as plain scalars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandConfig {
    /// Citation hops to walk outward from the seed.
    #[serde(default = "default_hops")]
    pub hops: u32,

    /// Minimum citation count (exclusive) for fetched works; 0 disables the
    /// clause.
    #[serde(default = "default_min_citations")]
    pub min_citations: u32,

    /// Minimum publication year (exclusive) for fetched works.
    #[serde(default = "default_year_after")]
    pub year_after: i32,

    /// Comma-separated field projection for fetched works.
    #[serde(default = "default_select")]
    pub select: String,

    /// Frontier IDs per citing-works request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between hops, in seconds.
    #[serde(default)]
    pub hop_delay_secs: f64,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            hops: default_hops(),
            min_citations: default_min_citations(),
            year_after: default_year_after(),
            select: default_select(),
            chunk_size: default_chunk_size(),
            hop_delay_secs: 0.0,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openalex.org".to_string()
}

fn default_concurrency() -> usize {
    30
}

fn default_per_page() -> usize {
    200
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base() -> f64 {
    1.5
}

fn default_backoff_floor() -> f64 {
    0.5
}

fn default_rate_limit_delay() -> u64 {
    2
}

fn default_blocked_delay() -> u64 {
    5
}

fn default_hops() -> u32 {
    1
}

fn default_min_citations() -> u32 {
    20
}

fn default_year_after() -> i32 {
    1920
}

fn default_select() -> String {
    "id,doi,title,publication_year,cited_by_count,cited_by_api_url".to_string()
}

fn default_chunk_size() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn parses_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [api]
            mailto = "graphs@example.org"
            concurrency = 10

            [expand]
            hops = 2
            min_citations = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.api.mailto.as_deref(), Some("graphs@example.org"));
        assert_eq!(config.api.concurrency, 10);
        assert_eq!(config.api.per_page, 200);
        assert_eq!(config.expand.hops, 2);
        assert_eq!(config.expand.min_citations, 5);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = Config::default();
        config.api.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.per_page = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.expand.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn backoff_delay_grows_with_failures() {
        let retry = RetryConfig::default();
        assert_eq!(retry.backoff_delay(1), Duration::from_secs_f64(1.5));
        assert_eq!(retry.backoff_delay(2), Duration::from_secs_f64(2.0));
        assert!(retry.backoff_delay(3) > retry.backoff_delay(2));
    }
}
