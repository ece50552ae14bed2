//! link-mapper main entry point
//!
//! This is the command-line interface for the link-mapper crawler and graph
//! exporter.

use anyhow::Context;
use clap::{Parser, Subcommand};
use link_mapper::config::{load_config_with_hash, Config};
use link_mapper::crawler::{crawl, CrawlOutcome};
use link_mapper::geo::{place_nodes, TableResolver};
use link_mapper::graph::{
    load_traffic, AggregationPolicy, ExportOptions, Graph, GraphBuilder, GraphFormat, WeightScale,
};
use link_mapper::output::{generate_markdown_summary, print_report, write_graph, CrawlReport};
use link_mapper::storage::{load_corpus, save_corpus, MemoryStore, RecordStore};
use link_mapper::url::Scope;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// link-mapper: crawl a hyperlinked corpus and export its link graph
///
/// link-mapper follows in-scope links from a seed page, records the links of
/// every fetched page, and writes the result as an adjacency list, a DOT
/// document or a weighted JSON edge map.
#[derive(Parser, Debug)]
#[command(name = "link-mapper")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a hyperlinked corpus and export its link graph", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl from the configured seed and export the results
    Crawl {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Ignore records left in the corpus file by a previous run
        #[arg(long)]
        fresh: bool,

        /// Validate config and show what would be crawled without actually crawling
        #[arg(long)]
        dry_run: bool,
    },

    /// Aggregate corpus or traffic files into a graph and export it
    Convert {
        /// Corpus files, or JSON edge maps with --traffic
        #[arg(long = "input", value_name = "FILE", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Treat inputs as `{source: {target: volume}}` edge maps
        #[arg(long)]
        traffic: bool,

        /// Destination file
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = GraphFormat::Adjacency)]
        format: GraphFormat,

        /// How repeated edge observations are combined
        #[arg(long, value_enum)]
        policy: Option<AggregationPolicy>,

        /// Name of the DOT digraph
        #[arg(long, default_value = "wikipedia")]
        graph_name: String,

        /// Write one weighted statement per edge in DOT output
        #[arg(long)]
        weighted: bool,

        /// Scale DOT weights by log2
        #[arg(long, requires = "weighted")]
        log_scale: bool,
    },

    /// Report which nodes of an edge map can be placed on a map
    Locate {
        /// JSON edge map
        #[arg(long, value_name = "FILE")]
        graph: PathBuf,

        /// JSON object of `{address: [lat, lon]}`
        #[arg(long, value_name = "FILE")]
        table: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl {
            config,
            fresh,
            dry_run,
        } => {
            tracing::info!("Loading configuration from: {}", config.display());
            let (config, config_hash) = match load_config_with_hash(&config) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    (cfg, hash)
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            };

            if dry_run {
                handle_dry_run(&config)?;
            } else {
                handle_crawl(config, config_hash, fresh).await?;
            }
        }
        Command::Convert {
            inputs,
            traffic,
            output,
            format,
            policy,
            graph_name,
            weighted,
            log_scale,
        } => {
            // Traffic inputs carry volumes worth summing; corpora count links
            let policy = policy.unwrap_or(if traffic {
                AggregationPolicy::Traffic
            } else {
                AggregationPolicy::Occurrences
            });
            let options = ExportOptions {
                format,
                graph_name,
                weights: weight_scale(weighted, log_scale),
            };
            handle_convert(&inputs, traffic, policy, &options, &output)?;
        }
        Command::Locate { graph, table } => {
            handle_locate(&graph, &table)?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_mapper=info,warn"),
            1 => EnvFilter::new("link_mapper=debug,info"),
            2 => EnvFilter::new("link_mapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn weight_scale(weighted: bool, log_scale: bool) -> Option<WeightScale> {
    match (weighted, log_scale) {
        (false, _) => None,
        (true, false) => Some(WeightScale::Raw),
        (true, true) => Some(WeightScale::Log2),
    }
}

fn export_options(config: &Config) -> ExportOptions {
    ExportOptions {
        format: config.output.format,
        graph_name: config.output.graph_name.clone(),
        weights: weight_scale(config.output.weighted, config.output.log_scale),
    }
}

/// Handles `crawl --dry-run`: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let scope = Scope::from_config(&config.scope)?;
    let seed = scope.seed_identifier(&config.crawler.seed)?;

    println!("=== link-mapper Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {} ({})", seed, scope.url_for(&seed));
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Max pages: {}", describe_limit(config.crawler.max_pages));
    println!("  Max depth: {}", describe_limit(config.crawler.max_depth));
    println!(
        "  Max duration: {}",
        config
            .crawler
            .max_duration_secs
            .map(|secs| format!("{}s", secs))
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!(
        "  Retries: {} ({}ms apart)",
        config.crawler.max_retries, config.crawler.retry_delay_ms
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nScope:");
    println!("  Base URL: {}", scope.base_url());
    println!("  Allowed domain: {}", config.scope.allowed_domain);
    println!("  Path prefix: {}", scope.path_prefix());
    if config.scope.reject_all_namespaces {
        println!("  Namespaces: all rejected");
    } else {
        println!(
            "  Excluded namespaces: {}",
            config.scope.excluded_namespaces.join(", ")
        );
    }

    println!("\nOutput:");
    println!("  Corpus: {}", config.output.corpus_path);
    println!(
        "  Graph: {} ({}, {} policy)",
        config.output.graph_path, config.output.format, config.output.policy
    );
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

fn describe_limit(limit: Option<u32>) -> String {
    limit
        .map(|value| value.to_string())
        .unwrap_or_else(|| "unlimited".to_string())
}

/// Handles the main crawl operation
///
/// Results are exported whether the crawl completed, stopped, was cancelled
/// with Ctrl-C, or failed on a store error.
async fn handle_crawl(
    config: Config,
    config_hash: String,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let corpus_path = Path::new(&config.output.corpus_path);

    let store = if !fresh && corpus_path.exists() {
        let previous = load_corpus(corpus_path)?;
        tracing::info!(
            "Keeping {} records from {} (use --fresh to discard them)",
            previous.len(),
            corpus_path.display()
        );
        Arc::new(MemoryStore::from_records(previous))
    } else {
        if fresh {
            tracing::info!("Starting fresh crawl (ignoring previous corpus)");
        }
        Arc::new(MemoryStore::new())
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling crawl");
            ctrl_c.cancel();
        }
    });

    let result = crawl(&config, store.clone(), cancel).await;

    match &result {
        Ok(outcome) => tracing::info!("Crawl finished: {}", outcome.status),
        Err(e) => tracing::error!("Crawl failed: {}", e),
    }

    export_results(&config, &config_hash, &*store, result.as_ref().ok())?;

    result?;
    Ok(())
}

/// Writes the corpus, graph, report and optional summary of a run
fn export_results(
    config: &Config,
    config_hash: &str,
    store: &dyn RecordStore,
    outcome: Option<&CrawlOutcome>,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = store.all()?;

    let written = save_corpus(Path::new(&config.output.corpus_path), records.values())?;
    tracing::info!(
        "Wrote {} records to {}",
        written,
        config.output.corpus_path
    );

    let mut builder = GraphBuilder::new(config.output.policy);
    builder.add_records(records.values());
    let graph = builder.build();

    let options = export_options(config);
    let export = write_graph(&graph, &options, Path::new(&config.output.graph_path))?;

    let Some(outcome) = outcome else {
        // No outcome after a fatal error; report what was saved
        println!(
            "Partial results: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        return Ok(());
    };

    let mut report = CrawlReport::from_run(&config.crawler.seed, outcome, store, &graph, config_hash)?;
    report.corpus_path = Some(config.output.corpus_path.clone());
    report.graph_path = Some(config.output.graph_path.clone());
    report.graph_format = Some(config.output.format.to_string());
    report.export = export;

    if let Some(summary_path) = &config.output.summary_path {
        generate_markdown_summary(&report, Path::new(summary_path))?;
        tracing::info!("Summary written to {}", summary_path);
    }

    print_report(&report);

    Ok(())
}

/// Handles `convert`: aggregates input files and exports the graph
fn handle_convert(
    inputs: &[PathBuf],
    traffic: bool,
    policy: AggregationPolicy,
    options: &ExportOptions,
    output: &Path,
) -> anyhow::Result<()> {
    let mut builder = GraphBuilder::new(policy);

    for input in inputs {
        if traffic {
            let edges = load_traffic(input)
                .with_context(|| format!("failed to read edge map {}", input.display()))?;
            tracing::debug!("Loaded {} sources from {}", edges.len(), input.display());
            builder.add_traffic(edges);
        } else {
            let records = load_corpus(input)
                .with_context(|| format!("failed to read corpus {}", input.display()))?;
            tracing::debug!("Loaded {} records from {}", records.len(), input.display());
            builder.add_records(records.iter());
        }
    }

    let graph = builder.build();
    let stats = write_graph(&graph, options, output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Wrote {} ({} policy): {} nodes, {} edges, {} nodes written",
        output.display(),
        policy,
        graph.node_count(),
        graph.edge_count(),
        stats.nodes_emitted
    );

    Ok(())
}

/// Handles `locate`: reports which nodes of an edge map have coordinates
fn handle_locate(graph_path: &Path, table_path: &Path) -> anyhow::Result<()> {
    let edges = load_traffic(graph_path)
        .with_context(|| format!("failed to read edge map {}", graph_path.display()))?;
    let resolver = TableResolver::from_json_file(table_path)
        .with_context(|| format!("failed to read coordinate table {}", table_path.display()))?;

    let mut builder = GraphBuilder::new(AggregationPolicy::Traffic);
    builder.add_traffic(edges);
    let graph: Graph = builder.build();

    let placement = place_nodes(&graph, &resolver);

    println!("=== Node Placement ===\n");
    for (node, coordinate) in &placement.positions {
        println!("  {} -> ({:.4}, {:.4})", node, coordinate.lat, coordinate.lon);
    }

    if !placement.unresolved.is_empty() {
        println!("\nUnresolved ({}):", placement.unresolved.len());
        for node in &placement.unresolved {
            println!("  - {}", node);
        }
    }

    println!(
        "\nPlaced {} of {} nodes ({} edges kept)",
        placement.positions.len(),
        graph.node_count(),
        graph.edge_count()
    );

    Ok(())
}
