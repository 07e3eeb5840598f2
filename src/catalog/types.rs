//! Catalog types

use crate::types::ReplicationCursor;
use serde::{Deserialize, Serialize};

/// How the static filter combines with the replication cursor filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// `<cursor filter> and <static filter>`
    #[default]
    Compose,
    /// Static filter only; no cursor filter and no ordering
    Override,
}

/// Extraction descriptor for one logical resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Resource name (e.g., "products")
    pub name: String,
    /// Path appended to the base URL (e.g., "/ItemCard")
    pub path: String,
    /// Primary key fields, in order
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Field used for incremental extraction
    #[serde(default)]
    pub replication_key: Option<String>,
    /// Fixed OData filter expression
    #[serde(default)]
    pub static_filter: Option<String>,
    /// How `static_filter` is applied
    #[serde(default)]
    pub filter_mode: FilterMode,
}

impl ResourceDescriptor {
    /// Create a descriptor with no replication key or filter
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            primary_key: Vec::new(),
            replication_key: None,
            static_filter: None,
            filter_mode: FilterMode::Compose,
        }
    }

    /// Set the primary key
    #[must_use]
    pub fn with_primary_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the replication key
    #[must_use]
    pub fn with_replication_key(mut self, field: impl Into<String>) -> Self {
        self.replication_key = Some(field.into());
        self
    }

    /// Set a static filter composed with the cursor filter
    #[must_use]
    pub fn with_static_filter(mut self, expr: impl Into<String>) -> Self {
        self.static_filter = Some(expr.into());
        self.filter_mode = FilterMode::Compose;
        self
    }

    /// Set a filter that replaces everything else
    #[must_use]
    pub fn with_filter_override(mut self, expr: impl Into<String>) -> Self {
        self.static_filter = Some(expr.into());
        self.filter_mode = FilterMode::Override;
        self
    }

    /// Check if the resource supports incremental extraction
    pub fn is_incremental(&self) -> bool {
        self.replication_key.is_some() && self.filter_mode != FilterMode::Override
    }

    /// Build the `$filter` expression for this resource.
    ///
    /// A cursor is only honoured when its key matches the replication key.
    pub fn default_filter(&self, cursor: Option<&ReplicationCursor>) -> Option<String> {
        if self.filter_mode == FilterMode::Override {
            return self.static_filter.clone();
        }

        let cursor_clause = match (&self.replication_key, cursor) {
            (Some(key), Some(cursor)) if *key == cursor.key => cursor.filter_clause(),
            _ => None,
        };

        match (cursor_clause, self.static_filter.as_deref()) {
            (Some(clause), Some(expr)) => Some(format!("{clause} and {expr}")),
            (Some(clause), None) => Some(clause),
            (None, Some(expr)) => Some(expr.to_string()),
            (None, None) => None,
        }
    }
}
