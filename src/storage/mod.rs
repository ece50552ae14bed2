//! Storage module for crawl results
//!
//! This module holds the page records produced by the crawl:
//! - The `RecordStore` trait shared by all crawl workers
//! - An in-memory `MemoryStore` implementation
//! - JSON corpus files for saving and reloading records

mod corpus;
mod memory;
mod traits;

pub use corpus::{load_corpus, save_corpus};
pub use memory::MemoryStore;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::url::Identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The extraction result for one successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Identifier the page was dispatched under
    pub identifier: Identifier,

    /// URL actually fetched, after redirects
    pub url: String,

    /// Document title, if the page had a non-empty one
    #[serde(default)]
    pub title: Option<String>,

    /// Distinct in-scope link targets
    #[serde(default)]
    pub links: BTreeSet<Identifier>,

    /// Distance from the seed
    #[serde(default)]
    pub depth: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl PageRecord {
    pub fn new(
        identifier: Identifier,
        url: impl Into<String>,
        title: Option<String>,
        links: BTreeSet<Identifier>,
        depth: u32,
    ) -> Self {
        Self {
            identifier,
            url: url.into(),
            title,
            links,
            depth,
            fetched_at: None,
        }
    }

    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }

    /// Title to display for this page, falling back to the identifier
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(self.identifier.as_str())
    }
}
