//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a crawl run,
//! including counts, the depth breakdown, and the files that were written.

use crate::output::report::{CrawlReport, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary from a crawl report
///
/// # Arguments
///
/// * `report` - The crawl report data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# link-mapper Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", report.seed));
    if let Some(started) = &report.started_at {
        md.push_str(&format!("- **Started**: {}\n", started.to_rfc3339()));
    }
    if let Some(finished) = &report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds ({:.2} minutes)\n",
        report.duration_seconds,
        report.duration_seconds / 60.0
    ));
    md.push_str(&format!("- **Status**: {}\n", report.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", report.config_hash));

    // Crawl counts
    md.push_str("## Crawl\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Fetched | {} |\n", report.pages_fetched));
    md.push_str(&format!("| Failed | {} |\n", report.pages_failed));
    md.push_str(&format!("| Pending | {} |\n", report.pending));
    md.push_str(&format!(
        "| Identifiers Seen | {} |\n\n",
        report.identifiers_seen
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        report.success_rate()
    ));
    md.push_str(&format!("- **Error Rate**: {:.2}%\n\n", report.error_rate()));

    // Graph counts
    md.push_str("## Link Graph\n\n");
    md.push_str(&format!("- **Nodes**: {}\n", report.nodes));
    md.push_str(&format!("- **Content Nodes**: {}\n", report.content_nodes));
    md.push_str(&format!("- **Dangling Nodes**: {}\n", report.dangling));
    md.push_str(&format!("- **Edges**: {}\n", report.edges));
    md.push_str(&format!("- **Links Recorded**: {}\n\n", report.total_links));

    if !report.depth_breakdown.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");

        for (depth, count) in &report.depth_breakdown {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    if report.corpus_path.is_some() || report.graph_path.is_some() {
        md.push_str("## Files\n\n");
        if let Some(corpus) = &report.corpus_path {
            md.push_str(&format!("- **Corpus**: `{}`\n", corpus));
        }
        if let Some(graph) = &report.graph_path {
            let format = report.graph_format.as_deref().unwrap_or("unknown");
            md.push_str(&format!(
                "- **Graph** ({}): `{}` ({} nodes written, {} edges processed)\n",
                format, graph, report.export.nodes_emitted, report.export.edges_processed
            ));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str("*Generated by link-mapper*\n");

    md
}
