//! HTTP module
//!
//! Authenticated GET requests against the resource API.
//!
//! # Features
//!
//! - **Retries**: exponential backoff for connection errors, timeouts, 429 and 5xx
//! - **Re-authentication**: one forced token refresh on 401, then give up
//! - **Rate Limiting**: optional token bucket using governor

mod executor;
mod rate_limit;
mod retry;

pub use executor::{ExecutorConfig, ExecutorConfigBuilder, RequestExecutor};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::RetryPolicy;
