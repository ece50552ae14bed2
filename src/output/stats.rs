//! Console report
//!
//! Prints the counts of a finished run to stdout.

use crate::output::report::CrawlReport;

/// Prints a crawl report to stdout in a formatted manner
///
/// Every run prints this, whether it completed, stopped early or was
/// cancelled.
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Run:");
    println!("  Seed: {}", report.seed);
    println!("  Status: {}", report.status);
    println!("  Duration: {:.1}s", report.duration_seconds);
    println!();

    println!("Crawl:");
    println!("  Fetched: {}", report.pages_fetched);
    println!("  Failed: {}", report.pages_failed);
    println!("  Pending: {}", report.pending);
    println!("  Identifiers seen: {}", report.identifiers_seen);
    println!();

    println!("Graph:");
    println!("  Nodes: {}", report.nodes);
    println!("  Edges: {}", report.edges);
    println!("  Dangling: {}", report.dangling);
    println!();

    if !report.depth_breakdown.is_empty() {
        println!("Pages by Depth:");
        for (depth, count) in &report.depth_breakdown {
            println!("  {}: {}", depth, count);
        }
        println!();
    }

    if let Some(corpus) = &report.corpus_path {
        println!("Corpus written to {}", corpus);
    }
    if let Some(graph) = &report.graph_path {
        println!(
            "Graph written to {} ({} nodes, {} edges processed)",
            graph, report.export.nodes_emitted, report.export.edges_processed
        );
    }

    let attempted = report.pages_fetched + report.pages_failed;
    println!(
        "\nSuccess Rate: {:.1}% ({} / {} fetches succeeded)",
        report.success_rate(),
        report.pages_fetched,
        attempted
    );
}
