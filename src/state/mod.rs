//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EntryState`: The lifecycle of one identifier (enqueued, in flight, done, failed)
//! - `Frontier`: The shared work queue and dedup set the crawl workers pull from

mod entry_state;
mod frontier;

// Re-export main types
pub use entry_state::EntryState;
pub use frontier::{Frontier, FrontierCounts, FrontierEntry, FrontierError};
