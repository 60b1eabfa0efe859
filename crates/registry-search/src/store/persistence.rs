//! Store persistence - snapshot read/write operations.
//!
//! Snapshots are postcard-encoded and zstd-compressed. Metadata content is
//! stored as JSON text because postcard cannot encode self-describing values.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read};
use std::path::Path;
use std::thread::available_parallelism;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::records::RecordStore;
use crate::error::{Result, SearchError};
use crate::types::{MetadataEntry, RecordId, SearchableRecord};

/// Snapshot format version - increment when changing the format.
pub const STORE_SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PersistentStorage {
    version: u32,
    /// Unix seconds when the snapshot was written.
    saved_at: u64,
    next_id: u64,
    records: Vec<PersistentRecord>,
}

#[derive(Serialize, Deserialize)]
struct PersistentRecord {
    id: u64,
    url: String,
    ds_id: Option<String>,
    head: Option<String>,
    head_describe: Option<String>,
    branches: Vec<String>,
    tags: Vec<String>,
    annex_uuid: Option<String>,
    annex_key_count: Option<u64>,
    annexed_files_in_wt_count: Option<u64>,
    annexed_files_in_wt_size: Option<u64>,
    git_objects_kb: Option<u64>,
    last_update: Option<u64>,
    processed: bool,
    metadata: Vec<PersistentMetadata>,
}

#[derive(Serialize, Deserialize)]
struct PersistentMetadata {
    extractor_name: String,
    extractor_version: Option<String>,
    dataset_version: Option<String>,
    content_json: String,
}

impl PersistentRecord {
    fn capture(id: RecordId, record: &SearchableRecord) -> Result<Self> {
        let metadata = record
            .metadata_entries()
            .map(|entry| -> Result<PersistentMetadata> {
                Ok(PersistentMetadata {
                    extractor_name: entry.extractor_name.clone(),
                    extractor_version: entry.extractor_version.clone(),
                    dataset_version: entry.dataset_version.clone(),
                    content_json: serde_json::to_string(&entry.content)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: id.0,
            url: record.url.clone(),
            ds_id: record.ds_id.clone(),
            head: record.head.clone(),
            head_describe: record.head_describe.clone(),
            branches: record.branches.clone(),
            tags: record.tags.clone(),
            annex_uuid: record.annex_uuid.clone(),
            annex_key_count: record.annex_key_count,
            annexed_files_in_wt_count: record.annexed_files_in_wt_count,
            annexed_files_in_wt_size: record.annexed_files_in_wt_size,
            git_objects_kb: record.git_objects_kb,
            last_update: record.last_update,
            processed: record.processed,
            metadata,
        })
    }

    fn restore(self) -> Result<(RecordId, SearchableRecord)> {
        let mut record = SearchableRecord::new(self.url);
        record.ds_id = self.ds_id;
        record.head = self.head;
        record.head_describe = self.head_describe;
        record.branches = self.branches;
        record.tags = self.tags;
        record.annex_uuid = self.annex_uuid;
        record.annex_key_count = self.annex_key_count;
        record.annexed_files_in_wt_count = self.annexed_files_in_wt_count;
        record.annexed_files_in_wt_size = self.annexed_files_in_wt_size;
        record.git_objects_kb = self.git_objects_kb;
        record.last_update = self.last_update;
        record.processed = self.processed;
        for stored in self.metadata {
            record.insert_metadata(MetadataEntry {
                extractor_name: stored.extractor_name,
                extractor_version: stored.extractor_version,
                dataset_version: stored.dataset_version,
                content: serde_json::from_str(&stored.content_json)?,
            });
        }
        Ok((RecordId(self.id), record))
    }
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Write operations
// ---------------------------------------------------------------------------

/// Writes a store snapshot atomically (temp file, then rename).
pub fn write_store_snapshot(path: &Path, store: &RecordStore) -> Result<()> {
    let records = store
        .entries()
        .iter()
        .map(|entry| PersistentRecord::capture(entry.id(), entry.record()))
        .collect::<Result<Vec<_>>>()?;
    let storage = PersistentStorage {
        version: STORE_SNAPSHOT_VERSION,
        saved_at: unix_now_secs(),
        next_id: store.next_id(),
        records,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|error| {
            SearchError::Internal(format!(
                "failed to create snapshot directory {}: {error}",
                parent.display()
            ))
        })?;
    }

    let tmp_path = path.with_extension("tmp");

    {
        let output = File::create(&tmp_path).map_err(|error| {
            SearchError::Internal(format!(
                "failed to create snapshot file {}: {error}",
                tmp_path.display()
            ))
        })?;

        let mut encoder = zstd::Encoder::new(output, 6).map_err(|error| {
            SearchError::Internal(format!("failed to create zstd encoder: {error}"))
        })?;

        let threads = available_parallelism().map(|x| x.get() as u32).unwrap_or(4);
        encoder.multithread(threads).map_err(|error| {
            SearchError::Internal(format!("failed to enable multi-threaded zstd: {error}"))
        })?;

        let mut output = BufWriter::new(encoder);
        postcard::to_io(&storage, &mut output).map_err(|error| {
            SearchError::Internal(format!("failed to encode snapshot with postcard: {error}"))
        })?;

        let encoder = output.into_inner().map_err(|error| {
            SearchError::Internal(format!("failed to flush snapshot: {}", error.error()))
        })?;
        let file = encoder.finish().map_err(|error| {
            SearchError::Internal(format!("failed to finish zstd frame: {error}"))
        })?;
        file.sync_all().map_err(|error| {
            SearchError::Internal(format!(
                "failed to sync snapshot file {}: {error}",
                tmp_path.display()
            ))
        })?;
    }

    fs::rename(&tmp_path, path).map_err(|error| {
        SearchError::Internal(format!(
            "failed to finalize snapshot file {}: {error}",
            path.display()
        ))
    })?;

    tracing::info!(
        "wrote store snapshot to {} ({} records)",
        path.display(),
        storage.records.len()
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

/// Loads a store snapshot.
///
/// Returns `None` when the file is missing, unreadable, or written by a
/// different format version.
pub fn load_store_snapshot(path: &Path) -> Option<RecordStore> {
    let input = match File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::NotFound => return None,
        Err(error) => {
            tracing::warn!("store snapshot read failed for {}: {}", path.display(), error);
            return None;
        }
    };

    let decoder = match zstd::Decoder::new(input) {
        Ok(decoder) => decoder,
        Err(error) => {
            tracing::warn!(
                "store snapshot decompress failed for {}: {}",
                path.display(),
                error
            );
            return None;
        }
    };

    let mut bytes = Vec::new();
    if let Err(error) = BufReader::new(decoder).read_to_end(&mut bytes) {
        tracing::warn!(
            "store snapshot decompress failed for {}: {}",
            path.display(),
            error
        );
        return None;
    }

    let storage: PersistentStorage = {
        let _span = tracing::info_span!("snapshot_decode", path = %path.display()).entered();
        match postcard::from_bytes(&bytes) {
            Ok(storage) => storage,
            Err(error) => {
                tracing::warn!(
                    "store snapshot decode failed for {}: {}",
                    path.display(),
                    error
                );
                return None;
            }
        }
    };

    if storage.version != STORE_SNAPSHOT_VERSION {
        tracing::warn!(
            "store snapshot version mismatch: {} != {}",
            storage.version,
            STORE_SNAPSHOT_VERSION
        );
        return None;
    }

    let saved_at = storage.saved_at;
    let records = match storage
        .records
        .into_iter()
        .map(PersistentRecord::restore)
        .collect::<Result<Vec<_>>>()
    {
        Ok(records) => records,
        Err(error) => {
            tracing::warn!(
                "store snapshot metadata restore failed for {}: {}",
                path.display(),
                error
            );
            return None;
        }
    };

    let store = RecordStore::from_parts(records, storage.next_id);
    tracing::info!(
        "loaded store snapshot from {} ({} records, saved_at={})",
        path.display(),
        store.len(),
        saved_at
    );
    Some(store)
}
