//! In-memory corpus of registered dataset records.

use std::collections::HashMap;

use crate::query::RecordQueryContext;
use crate::types::{RecordId, SearchableRecord};

/// A record together with its id and cached query context.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    id: RecordId,
    record: SearchableRecord,
    context: RecordQueryContext,
}

impl StoredRecord {
    fn new(id: RecordId, record: SearchableRecord) -> Self {
        let context = RecordQueryContext::new(&record);
        Self {
            id,
            record,
            context,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn record(&self) -> &SearchableRecord {
        &self.record
    }

    pub fn context(&self) -> &RecordQueryContext {
        &self.context
    }
}

/// Registered records in registration order, unique by URL.
#[derive(Debug, Default)]
pub struct RecordStore {
    entries: Vec<StoredRecord>,
    by_url: HashMap<String, usize>,
    next_id: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a record, replacing any record with the same URL.
    ///
    /// A replaced record keeps its id and its position.
    pub fn register(&mut self, record: SearchableRecord) -> RecordId {
        if let Some(&index) = self.by_url.get(&record.url) {
            let id = self.entries[index].id;
            self.entries[index] = StoredRecord::new(id, record);
            tracing::trace!(id = id.0, "updated record");
            return id;
        }

        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.by_url.insert(record.url.clone(), self.entries.len());
        self.entries.push(StoredRecord::new(id, record));
        tracing::trace!(id = id.0, "registered record");
        id
    }

    pub fn remove(&mut self, url: &str) -> Option<SearchableRecord> {
        let index = self.by_url.remove(url)?;
        let removed = self.entries.remove(index);
        for slot in self.by_url.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(removed.record)
    }

    pub fn get(&self, url: &str) -> Option<&StoredRecord> {
        self.by_url.get(url).map(|&index| &self.entries[index])
    }

    pub fn get_by_id(&self, id: RecordId) -> Option<&StoredRecord> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Stored records in registration order.
    pub fn entries(&self) -> &[StoredRecord] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &SearchableRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Rebuilds a store from persisted parts.
    ///
    /// Later duplicates of a URL replace earlier ones.
    pub(crate) fn from_parts(records: Vec<(RecordId, SearchableRecord)>, next_id: u64) -> Self {
        let mut store = Self::default();
        for (id, record) in records {
            match store.by_url.get(&record.url) {
                Some(&index) => store.entries[index] = StoredRecord::new(id, record),
                None => {
                    store.by_url.insert(record.url.clone(), store.entries.len());
                    store.entries.push(StoredRecord::new(id, record));
                }
            }
        }
        let max_id = store.entries.iter().map(|entry| entry.id.0 + 1).max();
        store.next_id = next_id.max(max_id.unwrap_or(0));
        store
    }
}
