//! Error types for the Business Central tap
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every error falls into one of three [`ErrorKind`]s, which is what the
//! request executor and the fetch loop branch on.

use thiserror::Error;

/// Coarse classification used for retry and re-authentication decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient failure, worth another attempt after a backoff delay
    Retriable,
    /// The server rejected our token (HTTP 401)
    Authorization,
    /// Nothing more can be done for this fetch session
    Fatal,
}

/// The main error type for the tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Token endpoint error{}: {message}", status_suffix(.status))]
    TokenEndpoint { status: Option<u16>, message: String },

    #[error("Unauthorized for '{path}' after token refresh")]
    Unauthorized { path: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for '{path}': {body}")]
    HttpStatus {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Request timeout for '{path}'")]
    Timeout { path: String },

    #[error("Giving up on '{path}' after {attempts} attempts: {last}")]
    RetriesExhausted {
        path: String,
        attempts: u32,
        last: String,
    },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode response from '{path}': {message}")]
    Decode { path: String, message: String },

    // ============================================================================
    // Catalog and State Errors
    // ============================================================================
    #[error("Resource '{name}' not found in catalog")]
    ResourceNotFound { name: String },

    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a token endpoint error
    pub fn token_endpoint(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::TokenEndpoint {
            status,
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(path: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            path: path.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout { .. } => ErrorKind::Retriable,
            Error::Http(e) => {
                if e.is_builder() || e.is_decode() {
                    ErrorKind::Fatal
                } else {
                    ErrorKind::Retriable
                }
            }
            Error::HttpStatus { status, .. } => classify_status(*status),
            _ => ErrorKind::Fatal,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Retriable
    }

    /// Check if this error is fatal for the fetch session
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

/// Classify an HTTP status code.
///
/// 5xx and 429 are transient, 401 asks for re-authentication, and every
/// other non-success status is fatal.
pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        401 => ErrorKind::Authorization,
        429 | 500..=599 => ErrorKind::Retriable,
        _ => ErrorKind::Fatal,
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Result type alias for the tap
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
