//! Frontier and dedup store shared by the crawl workers
//!
//! The frontier is the single source of truth for which identifiers have
//! been seen, which are waiting, which are being fetched, and which are
//! finished. Checking and inserting an identifier happens under one lock,
//! so no identifier is ever dispatched twice.

use crate::state::EntryState;
use crate::url::Identifier;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;

/// Errors raised by the frontier
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontierError {
    #[error("Frontier capacity of {0} tracked identifiers exceeded")]
    CapacityExceeded(usize),

    #[error("Identifier '{0}' is not in flight")]
    NotInFlight(Identifier),
}

/// An identifier handed to a worker, with its distance from the seed
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub id: Identifier,
    pub depth: u32,

    /// Insertion order, used to keep dispatch FIFO within a depth
    sequence: u64,
}

// Shallower entries are popped first from the BinaryHeap, then older ones
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .depth
            .cmp(&self.depth)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for FrontierEntry {}

/// Number of identifiers in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    /// Distinct identifiers ever accepted
    pub seen: usize,
    pub enqueued: usize,
    pub in_flight: usize,
    pub done: usize,
    pub failed: usize,
    /// Unseen identifiers offered after the frontier closed
    pub dropped: usize,
}

#[derive(Debug, Default)]
struct Inner {
    states: HashMap<Identifier, EntryState>,
    queue: BinaryHeap<FrontierEntry>,
    counts: FrontierCounts,
    next_sequence: u64,
    dispatched: u64,
    dispatch_limit: Option<u64>,
    capacity: Option<usize>,
    closed: bool,
}

enum Dispatch {
    Entry(FrontierEntry),
    Finished,
    Wait,
}

/// Work queue plus the set of every identifier seen during a run
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches at most `limit` entries, then closes
    pub fn with_dispatch_limit(self, limit: u64) -> Self {
        self.lock().dispatch_limit = Some(limit);
        self
    }

    /// Fails offers once `limit` distinct identifiers are tracked
    pub fn with_capacity_limit(self, limit: usize) -> Self {
        self.lock().capacity = Some(limit);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Nothing panics while holding the lock, so a poisoned state is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offers an identifier discovered at `depth`
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The identifier was new and is now enqueued
    /// * `Ok(false)` - Already seen, or the frontier is closed
    /// * `Err(FrontierError::CapacityExceeded)` - Tracking it would exceed the capacity
    pub fn offer(&self, id: Identifier, depth: u32) -> Result<bool, FrontierError> {
        let mut inner = self.lock();

        if inner.states.contains_key(&id) {
            return Ok(false);
        }

        if inner.closed {
            inner.counts.dropped += 1;
            return Ok(false);
        }

        if let Some(capacity) = inner.capacity {
            if inner.states.len() >= capacity {
                return Err(FrontierError::CapacityExceeded(capacity));
            }
        }

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.states.insert(id.clone(), EntryState::Enqueued);
        inner.queue.push(FrontierEntry {
            id,
            depth,
            sequence,
        });
        inner.counts.seen += 1;
        inner.counts.enqueued += 1;
        drop(inner);

        self.notify.notify_one();
        Ok(true)
    }

    /// Waits for the next entry to fetch
    ///
    /// Returns `None` once the frontier is exhausted, closed, or its
    /// dispatch budget is spent. While the queue is empty but fetches are
    /// still in flight, this waits for them to offer more work.
    pub async fn next(&self) -> Option<FrontierEntry> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a wakeup between check and await is not lost
            notified.as_mut().enable();

            match self.dispatch() {
                Dispatch::Entry(entry) => return Some(entry),
                Dispatch::Finished => return None,
                Dispatch::Wait => notified.await,
            }
        }
    }

    /// Non-blocking variant of [`Frontier::next`]
    pub fn try_next(&self) -> Option<FrontierEntry> {
        match self.dispatch() {
            Dispatch::Entry(entry) => Some(entry),
            Dispatch::Finished | Dispatch::Wait => None,
        }
    }

    fn dispatch(&self) -> Dispatch {
        let mut inner = self.lock();

        if inner.closed {
            return Dispatch::Finished;
        }

        let Some(entry) = inner.queue.pop() else {
            if inner.counts.in_flight == 0 {
                drop(inner);
                self.notify.notify_waiters();
                return Dispatch::Finished;
            }
            return Dispatch::Wait;
        };

        inner.states.insert(entry.id.clone(), EntryState::InFlight);
        inner.counts.enqueued -= 1;
        inner.counts.in_flight += 1;
        inner.dispatched += 1;

        if inner.dispatch_limit.is_some_and(|limit| inner.dispatched >= limit) {
            inner.closed = true;
            drop(inner);
            self.notify.notify_waiters();
        }

        Dispatch::Entry(entry)
    }

    /// Marks an in-flight identifier as finished
    pub fn complete(&self, id: &Identifier, success: bool) -> Result<(), FrontierError> {
        let mut inner = self.lock();

        match inner.states.get_mut(id) {
            Some(state) if *state == EntryState::InFlight => {
                *state = if success {
                    EntryState::Done
                } else {
                    EntryState::Failed
                };
            }
            _ => return Err(FrontierError::NotInFlight(id.clone())),
        }

        inner.counts.in_flight -= 1;
        if success {
            inner.counts.done += 1;
        } else {
            inner.counts.failed += 1;
        }

        let exhausted = inner.queue.is_empty() && inner.counts.in_flight == 0;
        drop(inner);

        if exhausted {
            self.notify.notify_waiters();
        }
        Ok(())
    }

    /// Stops accepting offers and stops dispatching
    ///
    /// Entries still enqueued stay counted as enqueued; in-flight entries
    /// can still be completed.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// True when nothing is enqueued or in flight
    pub fn is_exhausted(&self) -> bool {
        let inner = self.lock();
        inner.queue.is_empty() && inner.counts.in_flight == 0
    }

    /// True once the dispatch budget has been used up
    pub fn budget_spent(&self) -> bool {
        let inner = self.lock();
        inner
            .dispatch_limit
            .is_some_and(|limit| inner.dispatched >= limit)
    }

    /// Returns the state of a tracked identifier
    pub fn state_of(&self, id: &Identifier) -> Option<EntryState> {
        self.lock().states.get(id).copied()
    }

    pub fn snapshot(&self) -> FrontierCounts {
        self.lock().counts
    }
}
