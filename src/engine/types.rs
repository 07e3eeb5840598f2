//! Engine types
//!
//! Filter override hook and statistics for fetch sessions.

use crate::catalog::ResourceDescriptor;
use crate::types::ReplicationCursor;
use std::sync::Arc;

/// Custom `$filter` builder replacing the descriptor's default filter.
///
/// Returning `None` sends no filter at all. Supplying one also suppresses
/// `$orderby`.
pub type FilterBuilder =
    Arc<dyn Fn(&ResourceDescriptor, Option<&ReplicationCursor>) -> Option<String> + Send + Sync>;

/// Statistics from a fetch session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Total records decoded
    pub records: usize,
    /// Total pages requested
    pub pages: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl FetchStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

    /// Fold another session's stats into this one
    pub fn merge(&mut self, other: &FetchStats) {
        self.records += other.records;
        self.pages += other.pages;
        self.duration_ms += other.duration_ms;
    }
}
