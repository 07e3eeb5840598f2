//! Offset paginator
//!
//! The stop rule: an explicit continuation marker always continues; without
//! one, a full page continues and a short page ends the session. A final
//! page that happens to be exactly `page_size` long costs one extra request
//! that comes back empty.

use super::types::{PageState, ResponseShape};
use tracing::debug;

/// Compute the offset of the next page, or `None` when done
pub fn next_offset(previous_offset: u64, page_size: u32, shape: &ResponseShape) -> Option<u64> {
    let page_size = page_size.max(1);
    if shape.has_continuation || shape.record_count >= page_size as usize {
        Some(previous_offset + u64::from(page_size))
    } else {
        None
    }
}

/// Offset-based paginator for `$top`/`$skip` APIs
#[derive(Debug, Clone, Copy)]
pub struct OffsetPaginator {
    page_size: u32,
}

impl OffsetPaginator {
    /// Create a paginator; a zero page size is bumped to 1
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    /// Records per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fresh state at offset 0
    pub fn start(&self) -> PageState {
        PageState::new(self.page_size)
    }

    /// Record that a page was fetched and decide whether to continue.
    ///
    /// Returns `true` and advances `state` if another page should be
    /// requested.
    pub fn process(&self, state: &mut PageState, shape: &ResponseShape) -> bool {
        state.pages += 1;
        match next_offset(state.offset, state.page_size, shape) {
            Some(next) => {
                debug!(
                    "Page {} had {} records, next offset {next}",
                    state.pages, shape.record_count
                );
                state.advance(next);
                true
            }
            None => {
                debug!(
                    "Page {} had {} records, pagination complete",
                    state.pages, shape.record_count
                );
                false
            }
        }
    }
}
