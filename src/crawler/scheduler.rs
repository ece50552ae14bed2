//! Crawl scheduler: runs a fixed pool of workers over the shared frontier
//!
//! This module handles:
//! - Seeding the frontier and spawning the worker pool
//! - Fetch retries for transient failures
//! - Stop conditions (page budget, depth limit, wall-clock limit)
//! - Cancellation and fatal store errors
//! - Publishing the crawl phase to observers

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use crate::crawler::parser::extract_page;
use crate::state::{Frontier, FrontierCounts, FrontierEntry};
use crate::storage::{PageRecord, RecordStore};
use crate::url::Scope;
use crate::MapperError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Lifecycle of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Created but not started
    Idle,
    /// Workers are pulling from the frontier
    Running,
    /// No more dispatches; in-flight fetches are finishing
    Draining,
    /// All workers have exited
    Finished,
}

/// Which stop condition ended a run early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxPages,
    MaxDuration,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPages => write!(f, "page limit reached"),
            Self::MaxDuration => write!(f, "time limit reached"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    /// The frontier was exhausted
    Completed,
    /// A stop condition fired; enqueued identifiers were abandoned
    Stopped(StopReason),
    /// The cancellation token fired
    Cancelled,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Stopped(reason) => write!(f, "stopped ({})", reason),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub status: CrawlStatus,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    /// Identifiers accepted but never completed
    pub pending: usize,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: FrontierCounts,
}

/// Limits that shape a run
#[derive(Debug, Clone)]
struct CrawlLimits {
    workers: usize,
    max_pages: Option<u64>,
    max_depth: Option<u32>,
    max_duration: Option<Duration>,
    max_retries: u32,
    retry_delay: Duration,
    max_tracked: Option<usize>,
}

impl From<&CrawlerConfig> for CrawlLimits {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            workers: config.max_concurrent_fetches.max(1) as usize,
            max_pages: config.max_pages.map(u64::from),
            max_depth: config.max_depth,
            max_duration: config.max_duration_secs.map(Duration::from_secs),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_tracked: config.max_tracked_identifiers,
        }
    }
}

/// Drives a crawl from one seed to completion
pub struct Crawler {
    limits: CrawlLimits,
    scope: Arc<Scope>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn RecordStore>,
    phase: Arc<watch::Sender<CrawlPhase>>,
}

/// State shared by every worker in one run
struct WorkerContext {
    limits: CrawlLimits,
    scope: Arc<Scope>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn RecordStore>,
    frontier: Arc<Frontier>,
    phase: Arc<watch::Sender<CrawlPhase>>,
    cancel: CancellationToken,
    fetched: AtomicU64,
    failed: AtomicU64,
}

impl Crawler {
    /// Creates a crawler from a full configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The loaded configuration; `[crawler]` and `[scope]` are used
    /// * `fetcher` - Source of page content
    /// * `store` - Destination for page records; outlives the run
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, MapperError> {
        let scope = Scope::from_config(&config.scope)?;
        Ok(Self::with_scope(&config.crawler, scope, fetcher, store))
    }

    /// Creates a crawler from crawler settings and an explicit scope
    pub fn with_scope(
        config: &CrawlerConfig,
        scope: Scope,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let (phase, _) = watch::channel(CrawlPhase::Idle);
        Self {
            limits: CrawlLimits::from(config),
            scope: Arc::new(scope),
            fetcher,
            store,
            phase: Arc::new(phase),
        }
    }

    /// Returns a receiver that observes phase transitions
    pub fn subscribe_phase(&self) -> watch::Receiver<CrawlPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> CrawlPhase {
        *self.phase.borrow()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Runs the crawl until the frontier is exhausted, a stop condition
    /// fires, `cancel` fires, or a fatal store error occurs
    ///
    /// Records written before a fatal error stay in the store.
    ///
    /// # Arguments
    ///
    /// * `seed` - Full URL or bare identifier of the first page
    /// * `cancel` - Token that abandons the run, including in-flight fetches
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The run ended normally, early, or by cancellation
    /// * `Err(MapperError)` - The seed was out of scope, or the store or frontier failed
    pub async fn run(
        &self,
        seed: &str,
        cancel: CancellationToken,
    ) -> Result<CrawlOutcome, MapperError> {
        let start_time = Instant::now();
        let started_at = Utc::now();

        let seed_id = self.scope.seed_identifier(seed)?;

        let mut frontier = Frontier::new();
        if let Some(max_pages) = self.limits.max_pages {
            frontier = frontier.with_dispatch_limit(max_pages);
        }
        if let Some(max_tracked) = self.limits.max_tracked {
            frontier = frontier.with_capacity_limit(max_tracked);
        }
        let frontier = Arc::new(frontier);
        frontier.offer(seed_id.clone(), 0)?;

        tracing::info!(
            "Starting crawl from '{}' with {} workers",
            seed_id,
            self.limits.workers
        );
        self.phase.send_replace(CrawlPhase::Running);

        // Wall-clock limit closes the frontier; workers then drain
        let timed_out = Arc::new(AtomicBool::new(false));
        let timer = self.limits.max_duration.map(|limit| {
            let frontier = frontier.clone();
            let timed_out = timed_out.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                tracing::info!("Time limit of {:?} reached, draining", limit);
                timed_out.store(true, Ordering::SeqCst);
                frontier.close();
            })
        });

        let context = Arc::new(WorkerContext {
            limits: self.limits.clone(),
            scope: self.scope.clone(),
            fetcher: self.fetcher.clone(),
            store: self.store.clone(),
            frontier: frontier.clone(),
            phase: self.phase.clone(),
            cancel: cancel.child_token(),
            fetched: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..self.limits.workers {
            workers.spawn(worker_loop(context.clone(), worker_id));
        }

        let mut fatal: Option<MapperError> = None;
        while let Some(joined) = workers.join_next().await {
            let error = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(join_error) => MapperError::Worker(join_error.to_string()),
            };

            if fatal.is_none() {
                tracing::error!("Aborting crawl: {}", error);
                context.cancel.cancel();
                frontier.close();
                fatal = Some(error);
            }
        }

        if let Some(timer) = timer {
            timer.abort();
        }
        self.phase.send_replace(CrawlPhase::Finished);

        if let Some(error) = fatal {
            return Err(error);
        }

        let counts = frontier.snapshot();
        let status = if cancel.is_cancelled() {
            CrawlStatus::Cancelled
        } else if timed_out.load(Ordering::SeqCst) {
            CrawlStatus::Stopped(StopReason::MaxDuration)
        } else if frontier.budget_spent() && (counts.enqueued > 0 || counts.dropped > 0) {
            CrawlStatus::Stopped(StopReason::MaxPages)
        } else {
            CrawlStatus::Completed
        };

        let outcome = CrawlOutcome {
            status,
            pages_fetched: context.fetched.load(Ordering::SeqCst),
            pages_failed: context.failed.load(Ordering::SeqCst),
            pending: counts.enqueued + counts.in_flight,
            elapsed: start_time.elapsed(),
            started_at,
            finished_at: Utc::now(),
            counts,
        };

        tracing::info!(
            "Crawl {}: {} fetched, {} failed, {} pending in {:?}",
            outcome.status,
            outcome.pages_fetched,
            outcome.pages_failed,
            outcome.pending,
            outcome.elapsed
        );

        Ok(outcome)
    }
}

impl WorkerContext {
    /// Moves Running to Draining; later phases are left alone
    fn begin_draining(&self) {
        self.phase.send_if_modified(|phase| {
            if *phase == CrawlPhase::Running {
                *phase = CrawlPhase::Draining;
                true
            } else {
                false
            }
        });
    }

    /// Fetches a URL, retrying transient failures up to the configured limit
    async fn fetch_with_retries(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(url).await {
                Err(e) if e.is_transient() && attempt < self.limits.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} after {} (attempt {} of {})",
                        url,
                        e,
                        attempt,
                        self.limits.max_retries
                    );
                    tokio::time::sleep(self.limits.retry_delay).await;
                }
                result => return result,
            }
        }
    }

    /// Records a fetched page and offers its links one level deeper
    fn process_page(&self, entry: &FrontierEntry, page: FetchedPage) -> Result<(), MapperError> {
        // Relative links resolve against where the page actually lives
        let extracted = extract_page(&page.body, &page.final_url, &self.scope);

        let next_depth = entry.depth + 1;
        let follow = self.limits.max_depth.map_or(true, |max| next_depth <= max);
        let links: Vec<_> = if follow {
            extracted.links.iter().cloned().collect()
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Extracted {} links from '{}' ({} rejected)",
            extracted.links.len(),
            entry.id,
            extracted.rejected
        );

        let record = PageRecord::new(
            entry.id.clone(),
            page.final_url.as_str(),
            extracted.title,
            extracted.links,
            entry.depth,
        )
        .with_fetched_at(Utc::now());
        self.store.put(record)?;

        let mut offered = 0;
        for link in links {
            if self.frontier.offer(link, next_depth)? {
                offered += 1;
            }
        }
        if offered > 0 {
            tracing::trace!("'{}' added {} new identifiers", entry.id, offered);
        }

        Ok(())
    }
}

/// One worker: pull, fetch, extract, store, offer, complete
async fn worker_loop(context: Arc<WorkerContext>, worker_id: usize) -> Result<(), MapperError> {
    loop {
        let entry = tokio::select! {
            _ = context.cancel.cancelled() => return Ok(()),
            entry = context.frontier.next() => entry,
        };

        let Some(entry) = entry else {
            context.begin_draining();
            tracing::debug!("Worker {} found no more work", worker_id);
            return Ok(());
        };

        let url = context.scope.url_for(&entry.id);
        tracing::debug!(
            "Worker {} fetching {} (depth {})",
            worker_id,
            url,
            entry.depth
        );

        // Cancellation abandons the fetch; the entry stays in flight
        let result = tokio::select! {
            _ = context.cancel.cancelled() => return Ok(()),
            result = context.fetch_with_retries(&url) => result,
        };

        match result {
            Ok(page) => {
                context.process_page(&entry, page)?;
                context.frontier.complete(&entry.id, true)?;

                let fetched = context.fetched.fetch_add(1, Ordering::SeqCst) + 1;
                if fetched % PROGRESS_INTERVAL == 0 {
                    let counts = context.frontier.snapshot();
                    tracing::info!(
                        "Progress: {} pages fetched, {} failed, {} in frontier",
                        fetched,
                        counts.failed,
                        counts.enqueued
                    );
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                context.frontier.complete(&entry.id, false)?;
                context.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}
