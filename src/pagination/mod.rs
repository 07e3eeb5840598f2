//! Pagination module
//!
//! Offset pagination over OData `$top`/`$skip`.
//!
//! # Overview
//!
//! The [`OffsetPaginator`] is a pure state machine: it never touches HTTP.
//! After each page the fetcher hands it the [`ResponseShape`] of the raw
//! envelope and it decides whether another page exists. [`PageQuery`]
//! turns the current [`PageState`] plus ordering and filter into the
//! query parameters for the next request.

mod offset;
mod query;
mod types;

pub use offset::{next_offset, OffsetPaginator};
pub use query::PageQuery;
pub use types::{PageState, ResponseShape, CONTINUATION_KEY, RECORDS_KEY};
