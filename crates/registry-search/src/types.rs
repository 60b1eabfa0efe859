//! Record and result types shared by the store, the query engine and callers.
//!
//! The presentation layer converts `SearchResult` into its own payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier assigned to a record when it is registered in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// Output of one metadata extractor for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub extractor_name: String,
    pub extractor_version: Option<String>,
    /// The dataset version (commit) the extractor ran against.
    pub dataset_version: Option<String>,
    /// Opaque structured payload; searched as serialized text.
    pub content: Value,
}

impl MetadataEntry {
    pub fn new(extractor_name: impl Into<String>, content: Value) -> Self {
        Self {
            extractor_name: extractor_name.into(),
            extractor_version: None,
            dataset_version: None,
            content,
        }
    }
}

/// One registered dataset URL with its recorded attributes.
///
/// The record owns its metadata entries, at most one per extractor name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchableRecord {
    pub url: String,
    pub ds_id: Option<String>,
    pub head: Option<String>,
    pub head_describe: Option<String>,
    pub branches: Vec<String>,
    pub tags: Vec<String>,
    pub annex_uuid: Option<String>,
    pub annex_key_count: Option<u64>,
    pub annexed_files_in_wt_count: Option<u64>,
    pub annexed_files_in_wt_size: Option<u64>,
    pub git_objects_kb: Option<u64>,
    /// Unix timestamp (seconds) of the last dataset update.
    pub last_update: Option<u64>,
    /// Whether initial processing of the URL has completed.
    pub processed: bool,
    metadata: BTreeMap<String, MetadataEntry>,
}

impl SearchableRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Inserts an extractor's entry, returning the entry it replaced.
    pub fn insert_metadata(&mut self, entry: MetadataEntry) -> Option<MetadataEntry> {
        self.metadata.insert(entry.extractor_name.clone(), entry)
    }

    pub fn remove_metadata(&mut self, extractor_name: &str) -> Option<MetadataEntry> {
        self.metadata.remove(extractor_name)
    }

    pub fn metadata_entry(&self, extractor_name: &str) -> Option<&MetadataEntry> {
        self.metadata.get(extractor_name)
    }

    /// Entries ordered by extractor name.
    pub fn metadata_entries(&self) -> impl Iterator<Item = &MetadataEntry> {
        self.metadata.values()
    }

    pub fn metadata_len(&self) -> usize {
        self.metadata.len()
    }

    /// Whether the origin carries a `git-annex` branch.
    pub fn has_annex_branch(&self) -> bool {
        self.branches.iter().any(|branch| branch == "git-annex")
    }
}

/// How much metadata to include with each search result entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataReturn {
    #[default]
    Omit,
    /// Extractor names only.
    References,
    /// Extractor name to extracted content.
    Content,
}

/// Metadata attached to a result entry according to [`MetadataReturn`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultMetadata {
    References(Vec<String>),
    Content(BTreeMap<String, Value>),
}

/// A record in search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub id: RecordId,
    pub url: String,
    pub ds_id: Option<String>,
    pub head: Option<String>,
    pub head_describe: Option<String>,
    pub branches: Vec<String>,
    pub tags: Vec<String>,
    pub annex_key_count: Option<u64>,
    pub annexed_files_in_wt_count: Option<u64>,
    pub annexed_files_in_wt_size: Option<u64>,
    pub git_objects_kb: Option<u64>,
    pub last_update: Option<u64>,
    pub processed: bool,
    pub metadata: Option<ResultMetadata>,
}

impl ResultEntry {
    pub fn from_record(id: RecordId, record: &SearchableRecord, metadata: MetadataReturn) -> Self {
        let metadata = match metadata {
            MetadataReturn::Omit => None,
            MetadataReturn::References => Some(ResultMetadata::References(
                record.metadata.keys().cloned().collect(),
            )),
            MetadataReturn::Content => Some(ResultMetadata::Content(
                record
                    .metadata
                    .iter()
                    .map(|(name, entry)| (name.clone(), entry.content.clone()))
                    .collect(),
            )),
        };

        Self {
            id,
            url: record.url.clone(),
            ds_id: record.ds_id.clone(),
            head: record.head.clone(),
            head_describe: record.head_describe.clone(),
            branches: record.branches.clone(),
            tags: record.tags.clone(),
            annex_key_count: record.annex_key_count,
            annexed_files_in_wt_count: record.annexed_files_in_wt_count,
            annexed_files_in_wt_size: record.annexed_files_in_wt_size,
            git_objects_kb: record.git_objects_kb,
            last_update: record.last_update,
            processed: record.processed,
            metadata,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// The query that was executed.
    pub query: String,
    /// Entries on the requested page, in sorted order.
    pub entries: Vec<ResultEntry>,
    /// Total number of matching records across all pages.
    pub total: usize,
    /// The 1-based page number that was returned.
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// Number of records the query was evaluated against.
    pub scanned: usize,
    /// Terms to highlight in rendered results.
    pub highlight_terms: Vec<String>,
}
