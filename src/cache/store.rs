//! Cache Store Module
//!
//! Process-wide state behind the single-flight cache: cached aggregates,
//! the in-flight markers, and statistics. Every method is synchronous so
//! the store can sit behind a plain mutex that is never held across an await.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

use crate::cache::{CacheEntry, CacheStats, SharedRecords};
use crate::error::Result;

/// Outcome of one flight, published to every caller waiting on it.
pub type FlightOutcome = Result<SharedRecords>;

/// Receiving end of a flight's completion channel.
///
/// Holds `None` until the leader publishes; closes without a value if the
/// leader is dropped first.
pub type FlightReceiver = watch::Receiver<Option<FlightOutcome>>;

/// Sending end, owned by the leader.
pub type FlightSender = watch::Sender<Option<FlightOutcome>>;

// == Slot ==
/// What a caller should do for a key, decided atomically.
#[derive(Debug)]
pub enum Slot {
    /// A fresh entry exists
    Fresh(SharedRecords),
    /// Another caller is fetching; wait on its channel
    Wait(FlightReceiver),
    /// This caller now owns the key's fetch
    Lead(FlightSender),
}

// == Cache Store ==
/// Cached aggregates and in-flight markers, keyed by cache key.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Cached aggregates; stale entries stay until overwritten
    entries: HashMap<String, CacheEntry>,
    /// Keys with a fetch running, each with its completion channel
    in_flight: HashMap<String, FlightReceiver>,
    /// Performance statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Begin ==
    /// Checks freshness and in-flight state, and claims the key if neither
    /// applies. One call is one atomic state transition.
    pub fn begin(&mut self, key: &str, now: DateTime<Utc>) -> Slot {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                self.stats.record_hit();
                return Slot::Fresh(entry.records.clone());
            }
        }

        if let Some(rx) = self.in_flight.get(key) {
            self.stats.record_coalesced();
            return Slot::Wait(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        self.in_flight.insert(key.to_string(), rx);
        self.stats.record_miss();
        Slot::Lead(tx)
    }

    // == Complete ==
    /// Records a finished fetch and clears the key's in-flight marker.
    ///
    /// Only a successful fetch writes an entry; a failure leaves any stale
    /// entry in place.
    pub fn complete(&mut self, key: &str, outcome: &FlightOutcome, now: DateTime<Utc>, ttl: Duration) {
        if let Ok(records) = outcome {
            self.entries
                .insert(key.to_string(), CacheEntry::new(records.clone(), now, ttl));
        }
        self.in_flight.remove(key);
        self.stats.record_fetch(outcome.is_ok());
    }

    // == Release ==
    /// Clears the in-flight marker of a fetch that ended without an outcome.
    pub fn release(&mut self, key: &str) {
        self.in_flight.remove(key);
    }

    // == Get ==
    /// Returns the entry for `key` if it is fresh at `now`. Does not touch stats.
    pub fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired(now))
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.in_flight = self.in_flight.len();
        stats
    }

    // == Length ==
    /// Returns the number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
