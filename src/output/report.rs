//! Crawl report types
//!
//! This module defines the report assembled at the end of a run and the
//! error type shared by all output writers.

use crate::crawler::CrawlOutcome;
use crate::graph::{ExportStats, Graph};
use crate::storage::{RecordStore, StorageError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary statistics for a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    // Run metadata
    pub seed: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub status: String,
    pub config_hash: String,

    // Crawl counts
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub pending: usize,
    pub identifiers_seen: usize,

    // Graph counts
    pub nodes: usize,
    pub content_nodes: usize,
    pub edges: usize,
    pub dangling: u64,
    pub total_links: u64,

    // Depth breakdown (depth -> records)
    pub depth_breakdown: BTreeMap<u32, usize>,

    // Exported files
    pub corpus_path: Option<String>,
    pub graph_path: Option<String>,
    pub graph_format: Option<String>,
    pub export: ExportStats,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a report from a finished run, its store and the built graph
    pub fn from_run(
        seed: &str,
        outcome: &CrawlOutcome,
        store: &dyn RecordStore,
        graph: &Graph,
        config_hash: &str,
    ) -> OutputResult<Self> {
        Ok(Self {
            seed: seed.to_string(),
            started_at: Some(outcome.started_at),
            finished_at: Some(outcome.finished_at),
            duration_seconds: outcome.elapsed.as_secs_f64(),
            status: outcome.status.to_string(),
            config_hash: config_hash.to_string(),
            pages_fetched: outcome.pages_fetched,
            pages_failed: outcome.pages_failed,
            pending: outcome.pending,
            identifiers_seen: outcome.counts.seen,
            nodes: graph.node_count(),
            content_nodes: graph.content_count(),
            edges: graph.edge_count(),
            dangling: store.count_dangling()?,
            total_links: store.count_links()?,
            depth_breakdown: store.depth_breakdown()?,
            ..Self::default()
        })
    }

    /// Calculates the percentage of attempted fetches that succeeded
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_fetched + self.pages_failed;
        if attempted == 0 {
            0.0
        } else {
            (self.pages_fetched as f64 / attempted as f64) * 100.0
        }
    }

    /// Calculates the percentage of attempted fetches that failed
    pub fn error_rate(&self) -> f64 {
        let attempted = self.pages_fetched + self.pages_failed;
        if attempted == 0 {
            0.0
        } else {
            (self.pages_failed as f64 / attempted as f64) * 100.0
        }
    }
}
