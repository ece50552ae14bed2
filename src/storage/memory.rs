use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::PageRecord;
use crate::url::Identifier;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory record store keyed by identifier
///
/// An optional capacity bounds the number of distinct records; a write that
/// would add a record beyond it fails with [`StorageError::CapacityExceeded`].
/// Overwriting an existing record never counts against the capacity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<Identifier, PageRecord>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            records: RwLock::default(),
            capacity: Some(capacity),
        }
    }

    /// Creates a store pre-filled with records, e.g. from a saved corpus
    pub fn from_records(records: impl IntoIterator<Item = PageRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.identifier.clone(), record))
            .collect();
        Self {
            records: RwLock::new(records),
            capacity: None,
        }
    }
}

impl RecordStore for MemoryStore {
    fn put(&self, record: PageRecord) -> StorageResult<()> {
        let mut records = self.records.write().map_err(|_| StorageError::Poisoned)?;

        if let Some(capacity) = self.capacity {
            if records.len() >= capacity && !records.contains_key(&record.identifier) {
                return Err(StorageError::CapacityExceeded(capacity));
            }
        }

        records.insert(record.identifier.clone(), record);
        Ok(())
    }

    fn get(&self, id: &Identifier) -> StorageResult<Option<PageRecord>> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;
        Ok(records.get(id).cloned())
    }

    fn all(&self) -> StorageResult<BTreeMap<Identifier, PageRecord>> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;
        Ok(records.clone())
    }

    fn len(&self) -> StorageResult<usize> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;
        Ok(records.len())
    }
}
