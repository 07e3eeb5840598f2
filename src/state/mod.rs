//! State management module
//!
//! Replication bookmarks kept by the caller of the fetch engine.
//! The engine only reads a cursor; the CLI advances bookmarks as records
//! go out and persists them between runs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Per-resource bookmarks
//! - `StateManager` - Shared, file-backed state with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{Bookmark, State};
