// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Business Central OData tap
//!
//! Extracts records from Microsoft Dynamics 365 Business Central OData
//! endpoints.
//!
//! ## Features
//!
//! - **OAuth2 client credentials**: one shared token cache per credential set
//! - **Offset pagination**: `$top`/`$skip` with continuation-marker support
//! - **Retries**: exponential backoff for transient failures, one forced
//!   re-authentication on 401
//! - **Exact decimals**: numbers keep their source text, never pass through `f64`
//! - **Incremental extraction**: `$filter` on a replication key cursor
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dynamicsbc_tap::{Catalog, RequestExecutor, ResourceFetcher, TapConfig, TokenRegistry};
//! use futures::TryStreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dynamicsbc_tap::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let executor_config = config.executor_config();
//!     let client = executor_config.http_client()?;
//!     let tokens = TokenRegistry::global().store_for(&config.credentials(), &client);
//!     let executor = RequestExecutor::with_client(executor_config, client, tokens);
//!     let fetcher = ResourceFetcher::new(Arc::new(executor), config.page_size);
//!
//!     let catalog = Catalog::builtin()?;
//!     let products = catalog.get("products").expect("built-in resource");
//!
//!     let mut records = fetcher.fetch(products, None);
//!     while let Some(record) = records.try_next().await? {
//!         println!("{}", record.to_json_string()?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   ResourceFetcher ── PageQuery ──► RequestExecutor ──► RecordDecoder
//!         ▲                              │    ▲               │
//!         │                         retry│    │token          │
//!         └── OffsetPaginator ◄──────────┼────┼── ResponseShape
//!                                        ▼    │
//!                                   reqwest  TokenStore (per Credentials)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Record and cursor types
pub mod types;

/// OAuth2 client-credentials tokens
pub mod auth;

/// Authenticated requests with retry and rate limiting
pub mod http;

/// Offset pagination
pub mod pagination;

/// Exact-decimal response decoding
pub mod decode;

/// Resource descriptors and the built-in catalog
pub mod catalog;

/// Page loop for one resource
pub mod engine;

/// Runtime configuration
pub mod config;

/// Replication bookmarks
pub mod state;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{Credentials, TokenRegistry, TokenStore};
pub use catalog::{Catalog, FilterMode, ResourceDescriptor};
pub use config::TapConfig;
pub use engine::{FetchStats, ResourceFetcher};
pub use error::{Error, ErrorKind, Result};
pub use http::{ExecutorConfig, RequestExecutor, RetryPolicy};
pub use types::{FieldValue, Record, ReplicationCursor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
