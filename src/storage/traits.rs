//! Storage traits and error types
//!
//! This module defines the trait interface for record store backends and
//! associated error types.

use crate::storage::PageRecord;
use crate::url::Identifier;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record store capacity of {0} records exceeded")]
    CapacityExceeded(usize),

    #[error("Record store lock poisoned")]
    Poisoned,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// Stores are shared by every crawl worker, so all operations take `&self`
/// and implementations must be thread-safe.
pub trait RecordStore: Send + Sync {
    /// Inserts a record, overwriting any previous record for the same identifier
    fn put(&self, record: PageRecord) -> StorageResult<()>;

    /// Gets the record for an identifier
    fn get(&self, id: &Identifier) -> StorageResult<Option<PageRecord>>;

    /// Returns every record, ordered by identifier
    fn all(&self) -> StorageResult<BTreeMap<Identifier, PageRecord>>;

    /// Number of records stored
    fn len(&self) -> StorageResult<usize>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    // ===== Statistics =====

    /// Counts outbound links across all records
    fn count_links(&self) -> StorageResult<u64> {
        Ok(self
            .all()?
            .values()
            .map(|record| record.links.len() as u64)
            .sum())
    }

    /// Counts distinct link targets that have no record of their own
    fn count_dangling(&self) -> StorageResult<u64> {
        let records = self.all()?;
        let dangling: BTreeSet<&Identifier> = records
            .values()
            .flat_map(|record| record.links.iter())
            .filter(|target| !records.contains_key(*target))
            .collect();
        Ok(dangling.len() as u64)
    }

    /// Gets record count breakdown by depth
    ///
    /// Returns a map of depth -> number of records at that depth
    fn depth_breakdown(&self) -> StorageResult<BTreeMap<u32, usize>> {
        let mut breakdown = BTreeMap::new();
        for record in self.all()?.values() {
            *breakdown.entry(record.depth).or_insert(0) += 1;
        }
        Ok(breakdown)
    }
}
