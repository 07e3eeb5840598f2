//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes.

use super::types::{Bookmark, State};
use crate::error::{Error, Result};
use crate::types::{Record, ReplicationCursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state with optional file persistence
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file, `None` when in memory only
    path: Option<PathBuf>,
    /// Current state
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(State::new())
    }

    /// Wrap an existing state without file persistence
    pub fn with_state(state: State) -> Self {
        Self {
            path: None,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Create a state manager backed by `path`, loading it if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse(&contents)?
        } else {
            State::new()
        };

        Ok(Self {
            path: Some(path),
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Create a state manager from an inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_state(parse(json)?))
    }

    /// The state file path
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Cursor to resume `resource` from
    pub async fn cursor_for(&self, resource: &str) -> Option<ReplicationCursor> {
        self.state.read().await.cursor_for(resource)
    }

    /// Get the bookmark for a resource
    pub async fn bookmark(&self, resource: &str) -> Option<Bookmark> {
        self.state.read().await.get(resource).cloned()
    }

    /// Advance the bookmark of `resource` from an emitted record
    pub async fn observe(&self, resource: &str, key: &str, record: &Record) -> bool {
        self.state.write().await.advance(resource, key, record)
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Save current state to the backing file, if any
    pub async fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to_file(path).await,
            None => Ok(()),
        }
    }

    /// Save state to a specific file path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?
        };

        // Write to temp file first, then rename for atomicity
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }
}

fn parse(json: &str) -> Result<State> {
    if json.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(json).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
