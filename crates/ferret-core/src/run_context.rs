use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::RunStats;

/// Mutable state of a single run, shared by every in-flight page task.
///
/// Created per run and dropped with it; two runs never share a context.
#[derive(Debug)]
pub struct RunContext {
    visited: Mutex<HashSet<String>>,
    max_pages: Option<usize>,
    processed: AtomicUsize,
    skipped: AtomicUsize,
    fetch_errors: AtomicUsize,
}

impl RunContext {
    pub fn new(max_pages: Option<usize>) -> Self {
        Self {
            visited: Mutex::new(HashSet::new()),
            max_pages,
            processed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            fetch_errors: AtomicUsize::new(0),
        }
    }

    fn lock_visited(&self) -> MutexGuard<'_, HashSet<String>> {
        self.visited.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned visited set");
            poisoned.into_inner()
        })
    }

    /// Record `url` as visited. Returns false if it already was.
    pub fn mark_visited(&self, url: &str) -> bool {
        let mut visited = self.lock_visited();
        if visited.contains(url) {
            return false;
        }
        visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.lock_visited().contains(url)
    }

    /// Reserve one unit of the page budget.
    ///
    /// Check and increment happen in a single compare-exchange, so `N`
    /// concurrent callers never get more than `max_pages` reservations.
    pub fn try_reserve_page(&self) -> bool {
        let limit = self.max_pages.unwrap_or(usize::MAX);
        self.processed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then_some(n + 1)
            })
            .is_ok()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.max_pages
            .is_some_and(|limit| self.processed.load(Ordering::Acquire) >= limit)
    }

    pub fn record_skip(&self, fetch_error: bool) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        if fetch_error {
            self.fetch_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            pages_processed: self.processed.load(Ordering::Acquire),
            pages_skipped: self.skipped.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
        }
    }
}
