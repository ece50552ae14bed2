//! Output module for writing crawl results
//!
//! This module handles:
//! - Writing exported graphs to disk
//! - Building the end-of-run report
//! - Generating markdown summaries of crawl results

mod markdown;
mod report;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use report::{CrawlReport, OutputError, OutputResult};
pub use stats::print_report;

use crate::graph::{export, ExportOptions, ExportStats, Graph};
use std::path::Path;

/// Exports a graph and writes it to a file
///
/// # Arguments
///
/// * `graph` - The graph to export
/// * `options` - Format and naming for the export
/// * `path` - Destination file, replaced if it exists
///
/// # Returns
///
/// * `Ok(ExportStats)` - What the export wrote
/// * `Err(OutputError)` - Failed to serialize or write the graph
pub fn write_graph(graph: &Graph, options: &ExportOptions, path: &Path) -> OutputResult<ExportStats> {
    let (content, stats) = export(graph, options)?;
    std::fs::write(path, content)?;

    tracing::info!(
        "Wrote {} graph to {} ({} nodes, {} edges)",
        options.format,
        path.display(),
        stats.nodes_emitted,
        stats.edges_processed
    );

    Ok(stats)
}
