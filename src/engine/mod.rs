//! Execution engine module
//!
//! Page loop for one logical resource.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ResourceFetcher` - Walks a resource page by page and yields its pages or records
//! - `FilterBuilder` - Named override for the `$filter` expression
//! - `FetchStats` - Pages, records and duration of a session
//!
//! Pages are requested strictly one after another. A session always starts
//! at offset 0; incremental extraction across runs goes through the
//! replication cursor filter, never through a resumed offset.

mod types;

pub use types::{FetchStats, FilterBuilder};

use crate::catalog::ResourceDescriptor;
use crate::decode::{DecodedPage, RecordDecoder};
use crate::error::{Error, Result};
use crate::http::RequestExecutor;
use crate::pagination::{OffsetPaginator, PageQuery, PageState};
use crate::types::{Record, ReplicationCursor};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default records per page
pub const DEFAULT_PAGE_SIZE: u32 = 5000;

/// Fetches every record of a resource through the request executor
#[derive(Clone)]
pub struct ResourceFetcher {
    executor: Arc<RequestExecutor>,
    decoder: RecordDecoder,
    paginator: OffsetPaginator,
    filter_builder: Option<FilterBuilder>,
}

impl ResourceFetcher {
    /// Create a fetcher with the given page size
    pub fn new(executor: Arc<RequestExecutor>, page_size: u32) -> Self {
        Self {
            executor,
            decoder: RecordDecoder::new(),
            paginator: OffsetPaginator::new(page_size),
            filter_builder: None,
        }
    }

    /// Use a specific decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: RecordDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the descriptor-derived `$filter` with a custom builder
    #[must_use]
    pub fn with_filter_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&ResourceDescriptor, Option<&ReplicationCursor>) -> Option<String>
            + Send
            + Sync
            + 'static,
    {
        self.filter_builder = Some(Arc::new(builder));
        self
    }

    /// Records per page
    pub fn page_size(&self) -> u32 {
        self.paginator.page_size()
    }

    /// Stream the records of `descriptor`, optionally bounded below by `cursor`.
    ///
    /// The first error ends the stream; records of a failed page are never
    /// yielded.
    pub fn fetch<'a>(
        &'a self,
        descriptor: &'a ResourceDescriptor,
        cursor: Option<&'a ReplicationCursor>,
    ) -> BoxStream<'a, Result<Record>> {
        self.fetch_pages(descriptor, cursor)
            .map_ok(|records| stream::iter(records.into_iter().map(Ok::<_, Error>)))
            .try_flatten()
            .boxed()
    }

    /// Stream `descriptor` one page at a time.
    ///
    /// Nothing is requested until the stream is first polled.
    pub fn fetch_pages<'a>(
        &'a self,
        descriptor: &'a ResourceDescriptor,
        cursor: Option<&'a ReplicationCursor>,
    ) -> BoxStream<'a, Result<Vec<Record>>> {
        stream::try_unfold(Some(self.paginator.start()), move |state| {
            self.next_page(descriptor, cursor, state)
        })
        .boxed()
    }

    /// Fetch every record of `descriptor` into memory
    pub async fn fetch_all(
        &self,
        descriptor: &ResourceDescriptor,
        cursor: Option<&ReplicationCursor>,
    ) -> Result<(Vec<Record>, FetchStats)> {
        let start = Instant::now();
        let mut stats = FetchStats::new();
        let mut records = Vec::new();
        let mut state = self.paginator.start();

        info!("Starting fetch for resource: {}", descriptor.name);

        loop {
            let page = self.fetch_page(descriptor, cursor, &state).await?;
            stats.add_page();
            stats.add_records(page.records.len());
            records.extend(page.records);

            if !self.paginator.process(&mut state, &page.shape) {
                break;
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            "Completed fetch for {}: {} records in {} pages",
            descriptor.name, stats.records, stats.pages
        );

        Ok((records, stats))
    }

    /// Query parameters for the page `state` points at
    pub fn build_query(
        &self,
        descriptor: &ResourceDescriptor,
        cursor: Option<&ReplicationCursor>,
        state: &PageState,
    ) -> PageQuery {
        let query = PageQuery::for_page(state);

        match &self.filter_builder {
            Some(build) => query.filter(build(descriptor, cursor)),
            None => {
                let query = match descriptor.replication_key.as_deref() {
                    Some(key) if descriptor.is_incremental() => query.order_by_asc(key),
                    _ => query,
                };
                query.filter(descriptor.default_filter(cursor))
            }
        }
    }

    /// One step of the record stream: fetch the page, then decide on the next
    async fn next_page(
        &self,
        descriptor: &ResourceDescriptor,
        cursor: Option<&ReplicationCursor>,
        state: Option<PageState>,
    ) -> Result<Option<(Vec<Record>, Option<PageState>)>> {
        let Some(mut state) = state else {
            return Ok(None);
        };
        if state.pages == 0 {
            info!("Starting fetch for resource: {}", descriptor.name);
        }

        let page = self.fetch_page(descriptor, cursor, &state).await?;
        let more = self.paginator.process(&mut state, &page.shape);
        if !more {
            info!(
                "Completed fetch for {}: {} pages",
                descriptor.name, state.pages
            );
        }

        Ok(Some((page.records, more.then_some(state))))
    }

    async fn fetch_page(
        &self,
        descriptor: &ResourceDescriptor,
        cursor: Option<&ReplicationCursor>,
        state: &PageState,
    ) -> Result<DecodedPage> {
        let query = self.build_query(descriptor, cursor, state).to_pairs();
        let body = self.executor.execute(&descriptor.path, &query).await?;
        let page = self.decoder.decode_page(&descriptor.path, &body)?;

        debug!(
            "{}: offset {} returned {} records",
            descriptor.name,
            state.offset,
            page.records.len()
        );

        Ok(page)
    }
}

impl std::fmt::Debug for ResourceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceFetcher")
            .field("executor", &self.executor)
            .field("decoder", &self.decoder)
            .field("paginator", &self.paginator)
            .field("has_filter_builder", &self.filter_builder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
