//! Decoder types

use crate::pagination::RECORDS_KEY;
use serde::{Deserialize, Serialize};

/// Where the record list lives in a response body
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLocation {
    /// `value` array of an object envelope, or a top-level array
    #[default]
    Auto,
    /// Array under the given key of an object envelope
    Key(String),
    /// The body is the array
    Root,
}

impl RecordLocation {
    /// Records under the standard OData `value` key
    pub fn odata() -> Self {
        Self::Key(RECORDS_KEY.to_string())
    }
}
