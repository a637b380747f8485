//! Cache Statistics Module
//!
//! Tracks how lookups were answered and how upstream fetches ended.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups that found no fresh entry and started a fetch
    pub misses: u64,
    /// Lookups that joined a fetch already in flight
    pub coalesced: u64,
    /// Fetches that ran to completion, successful or not
    pub fetches: u64,
    /// Fetches that ended in an error
    pub fetch_failures: u64,
    /// Current number of entries in the cache, fresh or stale
    pub total_entries: usize,
    /// Keys with a fetch currently running
    pub in_flight: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Share of lookups that did not start an upstream fetch.
    ///
    /// Returns (hits + coalesced) / all lookups, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.coalesced;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.coalesced) as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    // == Record Fetch ==
    /// Counts one finished fetch.
    pub fn record_fetch(&mut self, succeeded: bool) {
        self.fetches += 1;
        if !succeeded {
            self.fetch_failures += 1;
        }
    }
}
