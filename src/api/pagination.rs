//! Cursor-based pagination over works listings.

use async_stream::try_stream;
use futures_util::{pin_mut, Stream, StreamExt};
use serde_json::Value;
use tracing::warn;

use crate::api::{ApiClient, ApiError, WorkFilter};
use crate::graph::extract_id;
use crate::models::RawWork;

/// Sentinel cursor requesting the first page.
const START_CURSOR: &str = "*";

/// One logical works query: search terms, filter predicate, field projection
/// and page size.
#[derive(Debug, Clone)]
pub struct WorksQuery {
    pub search: Option<String>,
    pub filter: Option<WorkFilter>,
    pub select: Option<String>,
    pub per_page: usize,
}

impl Default for WorksQuery {
    fn default() -> Self {
        Self {
            search: None,
            filter: None,
            select: None,
            per_page: 200,
        }
    }
}

impl WorksQuery {
    pub fn search(mut self, terms: impl Into<String>) -> Self {
        self.search = Some(terms.into());
        self
    }

    pub fn filter(mut self, filter: WorkFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Comma-separated field projection, or `None` for full records.
    pub fn select(mut self, select: Option<&str>) -> Self {
        self.select = select.map(str::to_owned);
        self
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }
}

impl ApiClient {
    /// Stream raw works for a query, following continuation cursors lazily.
    ///
    /// The sequence is not restartable; it ends on the first page with no
    /// results or when the server stops returning a continuation cursor. A
    /// page missing the expected fields counts as zero results rather than
    /// an error, since the service is not trusted to be schema-stable.
    /// Records are yielded one at a time so callers can consume arbitrarily
    /// large result sets without buffering them.
    pub fn stream_works(
        &self,
        query: &WorksQuery,
    ) -> impl Stream<Item = Result<RawWork, ApiError>> + '_ {
        let query = query.clone();
        try_stream! {
            let filter = match &query.filter {
                Some(filter) if !filter.is_empty() => Some(filter.render()?),
                _ => None,
            };

            let mut cursor = String::from(START_CURSOR);
            loop {
                let mut params: Vec<(&str, String)> = vec![
                    ("per-page", query.per_page.to_string()),
                    ("cursor", cursor.clone()),
                ];
                if let Some(search) = &query.search {
                    params.push(("search", search.clone()));
                }
                if let Some(filter) = &filter {
                    params.push(("filter", filter.clone()));
                }
                if let Some(select) = &query.select {
                    params.push(("select", select.clone()));
                }

                let page = self.get_json("/works", &params).await?;
                let results = match page.get("results").and_then(Value::as_array) {
                    Some(results) if !results.is_empty() => results.clone(),
                    _ => break,
                };
                for value in results {
                    match serde_json::from_value::<RawWork>(value) {
                        Ok(work) => yield work,
                        Err(e) => warn!("skipping unparseable work record: {e}"),
                    }
                }

                match page.pointer("/meta/next_cursor").and_then(Value::as_str) {
                    Some(next) if !next.is_empty() => cursor = next.to_string(),
                    _ => break,
                }
            }
        }
    }

    /// Fetch full records for a list of known work IDs, in batched chunks.
    ///
    /// Identifiers may be URL-shaped or bare. Useful for rehydrating an
    /// already-built ID list with a wider field projection.
    pub async fn fetch_works_by_ids(
        &self,
        ids: &[String],
        batch_size: usize,
        select: Option<&str>,
    ) -> Result<Vec<RawWork>, ApiError> {
        let batch_size = batch_size.clamp(1, 200);
        let mut out = Vec::new();
        for chunk in ids.chunks(batch_size) {
            let bare = chunk.iter().map(|id| extract_id(id).to_string());
            let query = WorksQuery::default()
                .filter(WorkFilter::new().ids(bare))
                .select(select)
                .per_page(batch_size);
            let stream = self.stream_works(&query);
            pin_mut!(stream);
            while let Some(work) = stream.next().await {
                out.push(work?);
            }
        }
        Ok(out)
    }
}
