//! Record storage for the search engine.
//!
//! ## Module Structure
//!
//! - `records` - In-memory corpus (`RecordStore`) kept in registration order
//! - `persistence` - Snapshot read/write operations

mod persistence;
mod records;

pub use persistence::{load_store_snapshot, write_store_snapshot, STORE_SNAPSHOT_VERSION};
pub use records::{RecordStore, StoredRecord};
