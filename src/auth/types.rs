//! Auth types
//!
//! Credentials identify a token cache; access tokens are what it holds.

use chrono::{DateTime, Utc};
use std::fmt;

/// Lifetime assumed when the token endpoint omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// OAuth2 client-credentials grant parameters
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Requested scope (space separated, sent verbatim)
    pub scope: String,
    /// Token endpoint URL
    pub token_endpoint: String,
}

impl Credentials {
    /// Create a new credential set
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
            token_endpoint: token_endpoint.into(),
        }
    }

    /// Form body for the token request
    pub(crate) fn grant_form(&self) -> [(&'static str, &str); 4] {
        [
            ("scope", self.scope.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("scope", &self.scope)
            .field("token_endpoint", &self.token_endpoint)
            .finish()
    }
}

/// Access token with expiration
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token
    pub value: String,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a new access token
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(value: impl Into<String>, seconds: i64) -> Self {
        Self::new(value, Utc::now() + chrono::Duration::seconds(seconds))
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        let buffer = chrono::Duration::seconds(30);
        Utc::now() + buffer >= self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
