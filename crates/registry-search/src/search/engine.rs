//! Query evaluation over the record corpus.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cancel::{CancellationToken, CANCEL_CHECK_INTERVAL};
use crate::config::SearchConfig;
use crate::error::Result;
use crate::filter::RecordFilter;
use crate::query::{CompiledPredicate, SearchQueryMatcher};
use crate::sort::{Page, SortKey};
use crate::store::{RecordStore, StoredRecord};
use crate::types::{MetadataReturn, ResultEntry, SearchResult, SearchableRecord};

/// Keeps the records accepted by `predicate`, in corpus order.
pub fn evaluate<'a>(
    predicate: &CompiledPredicate,
    corpus: &'a [SearchableRecord],
) -> Vec<&'a SearchableRecord> {
    corpus
        .iter()
        .filter(|record| predicate.matches(record))
        .collect()
}

/// Parallel form of [`evaluate`]; same membership and order.
pub fn evaluate_parallel<'a>(
    predicate: &CompiledPredicate,
    corpus: &'a [SearchableRecord],
) -> Vec<&'a SearchableRecord> {
    corpus
        .par_iter()
        .filter(|record| predicate.matches(record))
        .collect()
}

/// A search over the registered records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    /// Query text; blank means every record passes.
    pub query: String,
    pub filter: RecordFilter,
    /// Falls back to the configured default sort.
    pub sort: Option<SortKey>,
    /// Falls back to the first page of the configured default size.
    pub page: Option<Page>,
    pub metadata: MetadataReturn,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_page(mut self, number: usize, size: usize) -> Self {
        self.page = Some(Page::new(number, size));
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataReturn) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Compiles the query text, or `None` for a blank query.
pub(crate) fn compile_optional(query: &str) -> Result<Option<SearchQueryMatcher>> {
    if query.trim().is_empty() {
        return Ok(None);
    }
    SearchQueryMatcher::compile(query).map(Some)
}

/// Selects the stored records passing both the matcher and the filter.
///
/// Returns `None` if the search was cancelled.
pub fn select_records<'a>(
    store: &'a RecordStore,
    matcher: Option<&SearchQueryMatcher>,
    filter: &RecordFilter,
    parallel_threshold: usize,
    cancel_token: &CancellationToken,
) -> Option<Vec<&'a StoredRecord>> {
    let accepts = |entry: &StoredRecord| {
        filter.matches(entry.record())
            && matcher.map_or(true, |matcher| matcher.matches_context(entry.context()))
    };
    let entries = store.entries();

    if entries.len() >= parallel_threshold {
        let chunks: Vec<Vec<&StoredRecord>> = entries
            .par_chunks(CANCEL_CHECK_INTERVAL)
            .map(|chunk| {
                cancel_token.is_cancelled()?;
                Some(chunk.iter().filter(|entry| accepts(entry)).collect::<Vec<_>>())
            })
            .collect::<Option<_>>()?;
        return Some(chunks.into_iter().flatten().collect());
    }

    let mut selected = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        cancel_token.is_cancelled_sparse(i)?;
        if accepts(entry) {
            selected.push(entry);
        }
    }
    Some(selected)
}

/// Runs a search request against the store.
///
/// Returns `None` if the search was cancelled.
pub fn execute_search(
    store: &RecordStore,
    request: &SearchRequest,
    config: &SearchConfig,
    cancel_token: &CancellationToken,
) -> Result<Option<SearchResult>> {
    let started = Instant::now();
    let matcher = compile_optional(&request.query)?;
    request.filter.validate()?;
    let page = request
        .page
        .unwrap_or_else(|| Page::new(1, config.default_page_size))
        .normalized(config.max_page_size)?;
    let sort = request.sort.unwrap_or(config.default_sort);

    let Some(mut matched) = select_records(
        store,
        matcher.as_ref(),
        &request.filter,
        config.parallel_threshold,
        cancel_token,
    ) else {
        tracing::debug!(query = %request.query, "search cancelled");
        return Ok(None);
    };

    if cancel_token.is_cancelled().is_none() {
        return Ok(None);
    }

    matched.sort_by(|a, b| sort.compare(a.record(), b.record()));

    let total = matched.len();
    let entries = matched[page.bounds(total)]
        .iter()
        .map(|entry| ResultEntry::from_record(entry.id(), entry.record(), request.metadata))
        .collect::<Vec<_>>();
    let highlight_terms = matcher
        .as_ref()
        .map(SearchQueryMatcher::highlight_terms)
        .unwrap_or_default();

    tracing::info!(
        query = %request.query,
        sort = %sort,
        total,
        scanned = store.len(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "search finished"
    );

    Ok(Some(SearchResult {
        query: request.query.clone(),
        entries,
        total,
        page: page.number,
        page_size: page.size,
        page_count: page.page_count(total),
        scanned: store.len(),
        highlight_terms,
    }))
}
