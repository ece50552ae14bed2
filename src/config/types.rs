use crate::graph::{AggregationPolicy, GraphFormat};
use serde::Deserialize;

/// Default number of concurrent fetch workers
pub const DEFAULT_CONCURRENT_FETCHES: u32 = 8;

/// Upper bound on concurrent fetch workers
pub const MAX_CONCURRENT_FETCHES: u32 = 64;

/// Main configuration structure for link-mapper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub scope: ScopeConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed page: either a full URL or a bare identifier
    pub seed: String,

    /// Number of fetch workers running concurrently
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// Stop dispatching after this many fetches
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Do not follow links beyond this depth from the seed
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,

    /// Stop dispatching once the crawl has run this long (seconds)
    #[serde(rename = "max-duration-secs", default)]
    pub max_duration_secs: Option<u64>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Extra attempts for transient fetch failures
    #[serde(rename = "max-retries", default)]
    pub max_retries: u32,

    /// Pause between retry attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Hard limit on identifiers the frontier may track
    #[serde(rename = "max-tracked-identifiers", default)]
    pub max_tracked_identifiers: Option<usize>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Which links count as part of the corpus
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Origin that identifiers are resolved against, e.g. "https://en.wikipedia.org"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Domain pattern links must match (e.g. "en.wikipedia.org" or "*.example.org")
    #[serde(rename = "allowed-domain")]
    pub allowed_domain: String,

    /// Path prefix stripped to produce the bare identifier
    #[serde(rename = "path-prefix", default = "default_path_prefix")]
    pub path_prefix: String,

    /// Reject every colon-qualified identifier
    #[serde(rename = "reject-all-namespaces", default = "default_true")]
    pub reject_all_namespaces: bool,

    /// Namespaces rejected when `reject-all-namespaces` is off
    #[serde(rename = "excluded-namespaces", default)]
    pub excluded_namespaces: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON page-record corpus
    #[serde(rename = "corpus-path")]
    pub corpus_path: String,

    /// Path to the exported graph
    #[serde(rename = "graph-path")]
    pub graph_path: String,

    /// Graph serialization format
    #[serde(default)]
    pub format: GraphFormat,

    /// Name of the DOT digraph
    #[serde(rename = "graph-name", default = "default_graph_name")]
    pub graph_name: String,

    /// How repeated edge observations are combined
    #[serde(default)]
    pub policy: AggregationPolicy,

    /// Emit one weighted statement per edge in DOT output
    #[serde(default)]
    pub weighted: bool,

    /// Scale weights by log2 at export time
    #[serde(rename = "log-scale", default)]
    pub log_scale: bool,

    /// Optional markdown summary of the run
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

fn default_concurrency() -> u32 {
    DEFAULT_CONCURRENT_FETCHES
}

fn default_request_timeout() -> u64 {
    30
}

fn default_retry_delay() -> u64 {
    500
}

fn default_path_prefix() -> String {
    "/wiki/".to_string()
}

fn default_graph_name() -> String {
    "wikipedia".to_string()
}

fn default_true() -> bool {
    true
}
