//! State types for tracking extraction progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::types::{FieldValue, Record, ReplicationCursor};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Highest replication-key value seen for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Replication key field name
    pub replication_key: String,
    /// Highest value seen
    pub value: FieldValue,
}

impl Bookmark {
    /// Create a new bookmark
    pub fn new(replication_key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            replication_key: replication_key.into(),
            value: value.into(),
        }
    }

    /// The fetch lower bound this bookmark stands for
    pub fn to_cursor(&self) -> ReplicationCursor {
        ReplicationCursor::new(self.replication_key.clone(), self.value.clone())
    }
}

/// Complete state for the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-resource bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a resource
    pub fn get(&self, resource: &str) -> Option<&Bookmark> {
        self.bookmarks.get(resource)
    }

    /// Cursor to resume `resource` from
    pub fn cursor_for(&self, resource: &str) -> Option<ReplicationCursor> {
        self.get(resource).map(Bookmark::to_cursor)
    }

    /// Replace the bookmark for a resource
    pub fn set(&mut self, resource: impl Into<String>, bookmark: Bookmark) {
        self.bookmarks.insert(resource.into(), bookmark);
    }

    /// Advance the bookmark of `resource` with the `key` value of `record`.
    ///
    /// The bookmark only moves forward. Records without the key, with a null
    /// value, or with a value that does not compare with the current one
    /// leave it untouched. Returns whether the bookmark changed.
    pub fn advance(&mut self, resource: &str, key: &str, record: &Record) -> bool {
        let Some(value) = record.get(key).filter(|v| !v.is_null()) else {
            return false;
        };

        let newer = match self.bookmarks.get(resource) {
            Some(current) if current.replication_key == key => {
                value.cursor_cmp(&current.value) == Some(Ordering::Greater)
            }
            _ => true,
        };

        if newer {
            self.set(resource, Bookmark::new(key, value.clone()));
        }
        newer
    }

    /// Check if no bookmarks are held
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}
