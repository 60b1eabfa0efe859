//! RegistrySearchManager - main API for registry search.

use parking_lot::{Mutex, RwLock};

use super::engine::{compile_optional, execute_search, select_records, SearchRequest};
use crate::cancel::{CancellationToken, SearchVersionTracker};
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::filter::RecordFilter;
use crate::stats::{collection_stats, CollectionStats};
use crate::store::{load_store_snapshot, write_store_snapshot, RecordStore};
use crate::types::{RecordId, SearchResult, SearchableRecord};

/// Shared record store with search, statistics and snapshots.
///
/// Every search takes a new version; starting a search cancels searches
/// still running under older versions.
#[derive(Debug)]
pub struct RegistrySearchManager {
    store: RwLock<RecordStore>,
    search_version_tracker: SearchVersionTracker,
    /// Searches run one at a time.
    search_lane: Mutex<()>,
    config: SearchConfig,
}

impl RegistrySearchManager {
    /// Creates a manager with an empty store.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_store(config, RecordStore::new()))
    }

    /// Creates a manager, restoring the configured snapshot when one loads.
    pub fn open(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let store = match config.snapshot_path.as_deref() {
            Some(path) => load_store_snapshot(path).unwrap_or_else(|| {
                tracing::info!("starting with empty store; no usable snapshot at {}", path.display());
                RecordStore::new()
            }),
            None => RecordStore::new(),
        };
        Ok(Self::with_store(config, store))
    }

    fn with_store(config: SearchConfig, store: RecordStore) -> Self {
        Self {
            store: RwLock::new(store),
            search_version_tracker: SearchVersionTracker::new(),
            search_lane: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Registers or replaces the record with the same URL.
    pub fn register(&self, record: SearchableRecord) -> RecordId {
        self.store.write().register(record)
    }

    pub fn remove(&self, url: &str) -> Option<SearchableRecord> {
        self.store.write().remove(url)
    }

    pub fn get(&self, url: &str) -> Option<SearchableRecord> {
        self.store
            .read()
            .get(url)
            .map(|entry| entry.record().clone())
    }

    /// Reserves a search version for a later `search_versioned` call.
    ///
    /// Reserving a version cancels searches running under older ones.
    pub fn next_search_version(&self) -> u64 {
        self.search_version_tracker.next_version()
    }

    /// Runs a search under a fresh version.
    ///
    /// Returns `None` if a newer search superseded this one.
    pub fn search(&self, request: &SearchRequest) -> Result<Option<SearchResult>> {
        let version = self.next_search_version();
        self.search_versioned(request, version)
    }

    /// Runs a search under a version from `next_search_version`.
    pub fn search_versioned(
        &self,
        request: &SearchRequest,
        version: u64,
    ) -> Result<Option<SearchResult>> {
        let cancel_token = self.search_version_tracker.token_for_version(version);

        // Check if already cancelled before doing any work
        if cancel_token.is_cancelled().is_none() {
            return Ok(None);
        }

        let _search_lane_guard = self.search_lane.lock();

        if cancel_token.is_cancelled().is_none() {
            return Ok(None);
        }

        let store = self.store.read();
        let result = execute_search(&store, request, &self.config, &cancel_token)?;
        if result.is_none() {
            tracing::debug!(version, "search superseded by a newer search");
        }
        Ok(result)
    }

    /// Computes collection statistics over the records matching `query`.
    ///
    /// A blank query covers the whole store.
    pub fn stats(&self, query: &str) -> Result<CollectionStats> {
        let matcher = compile_optional(query)?;
        let store = self.store.read();
        let selected = select_records(
            &store,
            matcher.as_ref(),
            &RecordFilter::default(),
            self.config.parallel_threshold,
            &CancellationToken::noop(),
        )
        .ok_or_else(|| SearchError::Internal("statistics selection was cancelled".to_string()))?;
        let stats = collection_stats(selected.into_iter().map(|entry| entry.record()));
        Ok(stats)
    }

    /// Writes the store to the configured snapshot path.
    pub fn save_snapshot(&self) -> Result<()> {
        let path = self.config.snapshot_path.as_deref().ok_or_else(|| {
            SearchError::InvalidInput("no snapshot path configured".to_string())
        })?;
        let store = self.store.read();
        write_store_snapshot(path, &store)
    }
}
