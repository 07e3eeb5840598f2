//! Pagination types
//!
//! Page position and the parts of a response that drive the next-page
//! decision.

use serde_json::Value;

/// Envelope field announcing that more pages exist
pub const CONTINUATION_KEY: &str = "@odata.nextLink";

/// Envelope field holding the record list
pub const RECORDS_KEY: &str = "value";

/// Position of a fetch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    /// Records to skip; never decreases within a session
    pub offset: u64,
    /// Records per page, always positive
    pub page_size: u32,
    /// Pages requested so far
    pub pages: u32,
}

impl PageState {
    /// Start a session at offset 0
    pub fn new(page_size: u32) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
            pages: 0,
        }
    }

    /// True until the first page has been requested
    pub fn is_first_page(&self) -> bool {
        self.offset == 0
    }

    /// Move to `next`, which must not be behind the current offset
    pub(crate) fn advance(&mut self, next: u64) {
        debug_assert!(next >= self.offset, "offset must not decrease");
        self.offset = next.max(self.offset);
    }
}

/// What the paginator needs to know about one response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponseShape {
    /// The envelope carried a continuation marker
    pub has_continuation: bool,
    /// Number of records on the page
    pub record_count: usize,
}

impl ResponseShape {
    /// Create a shape directly
    pub fn new(has_continuation: bool, record_count: usize) -> Self {
        Self {
            has_continuation,
            record_count,
        }
    }

    /// Inspect a decoded response body.
    ///
    /// Records are counted under `value`, or the body itself when it is a
    /// top-level array. A null continuation marker does not count.
    pub fn from_body(body: &Value) -> Self {
        match body {
            Value::Object(map) => Self {
                has_continuation: map
                    .get(CONTINUATION_KEY)
                    .is_some_and(|link| !link.is_null()),
                record_count: map
                    .get(RECORDS_KEY)
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
            },
            Value::Array(items) => Self::new(false, items.len()),
            _ => Self::default(),
        }
    }
}
