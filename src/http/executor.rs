//! Request executor
//!
//! Issues one logical page request:
//! 1. attach a bearer token from the token source
//! 2. send, retrying transient failures with exponential backoff
//! 3. on 401, reject the token, fetch a fresh one and resend once
//! 4. a second 401 is fatal, as is any other non-success status

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::retry::RetryPolicy;
use crate::auth::{AccessToken, TokenSource};
use crate::error::{classify_status, Error, ErrorKind, Result};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the request executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Base URL that resource paths are appended to
    pub base_url: String,
    /// Per-call transport timeout
    pub timeout: Duration,
    /// Retry behaviour for transient failures
    pub retry: RetryPolicy,
    /// Optional client-side rate limit
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
            rate_limit: None,
            user_agent: format!("dynamicsbc-tap/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ExecutorConfig {
    /// Create a new config builder
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }

    /// Build a reqwest client carrying this config's timeout and user agent
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(Error::Http)
    }
}

/// Builder for executor config
#[derive(Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set a rate limit
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}

/// Outcome of a request that got an HTTP response
struct Reply {
    status: StatusCode,
    body: String,
    token: AccessToken,
}

/// Authenticated GET executor with retry and re-authentication
pub struct RequestExecutor {
    client: Client,
    config: ExecutorConfig,
    tokens: Arc<dyn TokenSource>,
    rate_limiter: Option<RateLimiter>,
}

impl RequestExecutor {
    /// Create an executor with its own HTTP client
    pub fn new(config: ExecutorConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self::with_client(config, client, tokens))
    }

    /// Create an executor sharing an existing HTTP client
    pub fn with_client(config: ExecutorConfig, client: Client, tokens: Arc<dyn TokenSource>) -> Self {
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        Self {
            client,
            config,
            tokens,
            rate_limiter,
        }
    }

    /// The executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Fetch `path` with the given query and return the response body
    pub async fn execute(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = self.build_url(path);

        let mut reply = self.send_with_retry(&url, path, query).await?;

        if reply.status == StatusCode::UNAUTHORIZED {
            info!("Received 401 for '{path}', refreshing access token");
            self.tokens.reject(&reply.token).await;
            reply = self.send_with_retry(&url, path, query).await?;

            if reply.status == StatusCode::UNAUTHORIZED {
                return Err(Error::Unauthorized {
                    path: path.to_string(),
                });
            }
        }

        if !reply.status.is_success() {
            return Err(Error::http_status(path, reply.status.as_u16(), reply.body));
        }

        debug!("GET {path} succeeded ({} bytes)", reply.body.len());
        Ok(reply.body)
    }

    /// Send until a non-transient reply arrives or the attempt budget runs out
    async fn send_with_retry(
        &self,
        url: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Reply> {
        let policy = self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;

            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            // Token failures are fatal and surface immediately
            let token = self.tokens.get_token().await?;

            let outcome = self
                .client
                .get(url)
                .query(query)
                .bearer_auth(&token.value)
                .send()
                .await;

            let (error, retry_after) = match outcome {
                Ok(response) => {
                    let status = response.status();
                    let retry_after = extract_retry_after(&response);
                    match response.text().await {
                        Ok(body) if classify_status(status.as_u16()) == ErrorKind::Retriable => {
                            (Error::http_status(path, status.as_u16(), body), retry_after)
                        }
                        Ok(body) => return Ok(Reply { status, body, token }),
                        Err(e) => (self.transport_error(path, e), None),
                    }
                }
                Err(e) => (self.transport_error(path, e), None),
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if !policy.should_retry(attempt) {
                return Err(Error::RetriesExhausted {
                    path: path.to_string(),
                    attempts: attempt,
                    last: error.to_string(),
                });
            }

            let delay = retry_after
                .map_or_else(|| policy.delay_for(attempt), |d| d.min(policy.max_backoff));
            warn!(
                "Request to '{path}' failed ({error}), attempt {attempt}/{}, retrying in {delay:?}",
                policy.max_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn transport_error(&self, path: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                path: path.to_string(),
            }
        } else {
            Error::Http(e)
        }
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract retry-after header value (seconds)
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
