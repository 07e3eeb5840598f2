//! Runtime configuration
//!
//! The tap reads a single JSON document with the OAuth client settings, the
//! API base URL and a few optional tuning knobs.

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::http::{ExecutorConfig, RateLimiterConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Tap configuration loaded from JSON
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapConfig {
    /// OAuth client ID
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,

    /// Token endpoint URL
    #[serde(default)]
    pub auth_url: String,

    /// API base URL, resource paths are appended to it
    #[serde(default)]
    pub base_url: String,

    /// OAuth scope string, sent verbatim
    #[serde(default)]
    pub oauth_scopes: String,

    /// Records per page (`$top`)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-call transport timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay, doubled on every further failure
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Cap for a single backoff delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Client-side request rate limit, unlimited when absent
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_page_size() -> u32 {
    5000
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    2000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a config document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("auth_url", &self.auth_url),
            ("base_url", &self.base_url),
            ("oauth_scopes", &self.oauth_scopes),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        for (field, value) in [("auth_url", &self.auth_url), ("base_url", &self.base_url)] {
            Url::parse(value).map_err(|e| Error::invalid_value(field, e.to_string()))?;
        }

        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be positive"));
        }
        if self.max_attempts == 0 {
            return Err(Error::invalid_value("max_attempts", "must be positive"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be positive when set",
            ));
        }

        Ok(())
    }

    /// Token grant parameters
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            &self.client_id,
            &self.client_secret,
            &self.oauth_scopes,
            &self.auth_url,
        )
    }

    /// Retry policy from the backoff settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }

    /// Request executor settings
    pub fn executor_config(&self) -> ExecutorConfig {
        let mut builder = ExecutorConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .retry(self.retry_policy());

        if let Some(rps) = self.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }
}

impl fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("auth_url", &self.auth_url)
            .field("base_url", &self.base_url)
            .field("oauth_scopes", &self.oauth_scopes)
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("requests_per_second", &self.requests_per_second)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
