//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetcher` trait
//! - HTML parsing and link extraction
//! - The worker pool that drives a crawl to completion

mod fetcher;
mod parser;
mod scheduler;

pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher, MAX_REDIRECTS};
pub use parser::{extract_page, ExtractedPage};
pub use scheduler::{CrawlOutcome, CrawlPhase, CrawlStatus, Crawler, StopReason};

use crate::config::Config;
use crate::storage::RecordStore;
use crate::MapperError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client from the `[user-agent]` table
/// 2. Seed the frontier from `[crawler].seed`
/// 3. Fetch pages and follow in-scope links until the run ends
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `store` - Where page records are written; it keeps them after the run
/// * `cancel` - Token that abandons the crawl
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Crawl completed, stopped early, or was cancelled
/// * `Err(MapperError)` - Crawl failed
pub async fn crawl(
    config: &Config,
    store: Arc<dyn RecordStore>,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, MapperError> {
    let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent, timeout)?);
    let crawler = Crawler::new(config, fetcher, store)?;
    crawler.run(&config.crawler.seed, cancel).await
}
