//! Token store implementation
//!
//! Caches the client-credentials access token and serialises refreshes so
//! that concurrent callers share a single token-endpoint call.

use super::types::{AccessToken, Credentials, DEFAULT_TOKEN_LIFETIME_SECS};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Source of bearer tokens for the request executor
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a valid token, refreshing if necessary
    async fn get_token(&self) -> Result<AccessToken>;

    /// Report that the server rejected `stale`.
    ///
    /// The next `get_token` must not hand it out again. If the cache already
    /// holds a newer token this is a no-op.
    async fn reject(&self, stale: &AccessToken);
}

/// Access token cache for one credential set
pub struct TokenStore {
    /// Grant parameters
    credentials: Credentials,
    /// Current token, `None` when missing or invalidated
    cached: RwLock<Option<AccessToken>>,
    /// HTTP client for token requests
    http_client: Client,
    /// Number of completed token-endpoint exchanges
    refreshes: AtomicU64,
}

impl TokenStore {
    /// Create a token store for the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self::with_client(credentials, Client::new())
    }

    /// Create a token store with a custom HTTP client
    pub fn with_client(credentials: Credentials, http_client: Client) -> Self {
        Self {
            credentials,
            cached: RwLock::new(None),
            http_client,
            refreshes: AtomicU64::new(0),
        }
    }

    /// The credentials this store exchanges
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// How many times the token endpoint has been called successfully
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Get a valid token, refreshing if necessary
    pub async fn get_token(&self) -> Result<AccessToken> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
        }

        let token = self.exchange().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Mark the current token stale, forcing the next `get_token` to refresh
    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        *cached = None;
    }

    /// Invalidate only if `stale` is still the cached token.
    ///
    /// Returns whether anything was invalidated.
    pub async fn invalidate_if_current(&self, stale: &AccessToken) -> bool {
        let mut cached = self.cached.write().await;
        match cached.as_ref() {
            Some(current) if current.value == stale.value => {
                *cached = None;
                true
            }
            _ => false,
        }
    }

    /// Perform the client-credentials exchange
    async fn exchange(&self) -> Result<AccessToken> {
        debug!(
            "Requesting access token from {}",
            self.credentials.token_endpoint
        );

        let response = self
            .http_client
            .post(&self.credentials.token_endpoint)
            .form(&self.credentials.grant_form())
            .send()
            .await
            .map_err(|e| Error::token_endpoint(None, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::token_endpoint(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(Error::token_endpoint(Some(status.as_u16()), body));
        }

        let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            Error::token_endpoint(Some(status.as_u16()), format!("malformed token response: {e}"))
        })?;
        let token = token_response.into_access_token()?;

        let n = self.refreshes.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "Obtained access token for client '{}' (exchange #{n}, expires {})",
            self.credentials.client_id, token.expires_at
        );
        Ok(token)
    }
}

#[async_trait]
impl TokenSource for TokenStore {
    async fn get_token(&self) -> Result<AccessToken> {
        TokenStore::get_token(self).await
    }

    async fn reject(&self, stale: &AccessToken) {
        if self.invalidate_if_current(stale).await {
            debug!("Invalidated rejected access token");
        } else {
            debug!("Rejected token already replaced, reusing the newer one");
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("credentials", &self.credentials)
            .field("refreshes", &self.refresh_count())
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Seconds; some identity providers send it as a string
    #[serde(default)]
    expires_in: Option<Value>,
}

impl TokenResponse {
    fn into_access_token(self) -> Result<AccessToken> {
        if self.access_token.is_empty() {
            return Err(Error::token_endpoint(None, "empty access_token"));
        }
        let seconds = match self.expires_in {
            None | Some(Value::Null) => DEFAULT_TOKEN_LIFETIME_SECS,
            Some(Value::Number(n)) => n.to_string().parse::<i64>().map_err(|_| {
                Error::token_endpoint(None, format!("invalid expires_in: {n}"))
            })?,
            Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
                Error::token_endpoint(None, format!("invalid expires_in: {s}"))
            })?,
            Some(other) => {
                return Err(Error::token_endpoint(
                    None,
                    format!("invalid expires_in: {other}"),
                ))
            }
        };
        Ok(AccessToken::expires_in(self.access_token, seconds))
    }
}

// ============================================================================
// Registry
// ============================================================================

static GLOBAL_REGISTRY: LazyLock<TokenRegistry> = LazyLock::new(TokenRegistry::new);

/// One shared [`TokenStore`] per distinct [`Credentials`] value
#[derive(Debug, Default)]
pub struct TokenRegistry {
    stores: Mutex<HashMap<Credentials, Arc<TokenStore>>>,
}

impl TokenRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static TokenRegistry {
        &GLOBAL_REGISTRY
    }

    /// Get the store for `credentials`, creating it on first use
    pub fn store_for(&self, credentials: &Credentials, http_client: &Client) -> Arc<TokenStore> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        stores
            .entry(credentials.clone())
            .or_insert_with(|| {
                debug!(
                    "Creating token store for client '{}'",
                    credentials.client_id
                );
                Arc::new(TokenStore::with_client(
                    credentials.clone(),
                    http_client.clone(),
                ))
            })
            .clone()
    }

    /// Number of distinct credential sets seen
    pub fn len(&self) -> usize {
        self.stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if no store has been created yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
