//! Dataset registry search, query, and storage library.
//!
//! This crate provides the search layer of a dataset registry:
//! - A query language over dataset records (fields, metadata extractors,
//!   AND/OR/NOT, grouping) compiled into reusable predicates
//! - Evaluation over an in-memory record store, sequential or parallel
//! - Attribute filters, sorting, pagination, and collection statistics
//! - Persistent store snapshots with compression

pub mod cancel;
pub mod config;
pub mod error;
pub mod filter;
pub mod query;
pub mod search;
pub mod sort;
pub mod stats;
pub mod store;
pub mod types;

// Re-export main types
pub use cancel::{CancellationToken, SearchVersionTracker};
pub use config::SearchConfig;
pub use error::{CompileError, LexError, ParseError, QueryErrorReport, Result, SearchError};
pub use filter::{Range, RecordFilter};
pub use query::{compile, CompiledPredicate, QueryNode, QueryParser, SearchQueryMatcher};
pub use search::{evaluate, RegistrySearchManager, SearchRequest};
pub use sort::{Page, SortKey};
pub use stats::{collection_stats, CollectionStats};
pub use store::RecordStore;
pub use types::{
    MetadataEntry, MetadataReturn, RecordId, ResultEntry, ResultMetadata, SearchResult,
    SearchableRecord,
};
