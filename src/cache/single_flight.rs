//! Single-Flight Cache
//!
//! Serves aggregates from the store, and makes sure that at most one fetch
//! runs per key at a time. Callers that arrive while a fetch is running wait
//! for its outcome instead of starting their own.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::cache::store::{FlightOutcome, FlightSender, Slot};
use crate::cache::{CacheStats, CacheStore, SharedRecords};
use crate::clock::Clock;
use crate::error::{ResaleError, Result};
use crate::models::PriceRecord;

// == Single-Flight Cache ==
/// Time-bounded cache with per-key fetch deduplication.
#[derive(Clone)]
pub struct SingleFlightCache {
    store: Arc<Mutex<CacheStore>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SingleFlightCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store: Arc::new(Mutex::new(CacheStore::new())),
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Get Or Fetch ==
    /// Returns the fresh aggregate for `key`, running `fetch` if there is none.
    ///
    /// - Fresh entry: returned without calling `fetch`.
    /// - Fetch already in flight: waits and returns that flight's outcome,
    ///   success or failure.
    /// - Otherwise this caller leads: runs `fetch`, caches a success for
    ///   `ttl` from completion, and publishes the outcome to its waiters.
    ///
    /// If a leader is dropped mid-fetch its waiters start over and one of
    /// them leads the next attempt.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<SharedRecords>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<PriceRecord>>>,
    {
        let mut fetch = Some(fetch);

        loop {
            let slot = self.lock().begin(key, self.clock.now());

            match slot {
                Slot::Fresh(records) => {
                    debug!(key, "cache hit");
                    return Ok(records);
                }
                Slot::Wait(mut rx) => {
                    debug!(key, "waiting on in-flight fetch");
                    let published = rx
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|published| (*published).clone());
                    if let Some(outcome) = published {
                        return outcome;
                    }
                    debug!(key, "in-flight fetch abandoned, retrying");
                }
                Slot::Lead(tx) => {
                    let flight = Flight {
                        store: Arc::clone(&self.store),
                        key: key.to_string(),
                        tx: Some(tx),
                    };

                    // Only reachable once: a leader always returns.
                    let fetch = fetch
                        .take()
                        .ok_or_else(|| ResaleError::Internal("fetch already consumed".to_string()))?;

                    debug!(key, "cache miss, fetching");
                    let outcome: FlightOutcome = fetch().await.map(Arc::new);
                    flight.finish(outcome.clone(), self.clock.now(), self.ttl);
                    return outcome;
                }
            }
        }
    }

    /// Returns the cached aggregate for `key` if it is fresh now.
    pub fn get_fresh(&self, key: &str) -> Option<SharedRecords> {
        self.lock()
            .get_fresh(key, self.clock.now())
            .map(|entry| entry.records.clone())
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.lock().is_in_flight(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    fn lock(&self) -> MutexGuard<'_, CacheStore> {
        lock_store(&self.store)
    }
}

fn lock_store(store: &Mutex<CacheStore>) -> MutexGuard<'_, CacheStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// == Flight ==
/// The leader's hold on a key. Dropping it without finishing releases the
/// marker, which closes the channel and wakes every waiter.
struct Flight {
    store: Arc<Mutex<CacheStore>>,
    key: String,
    tx: Option<FlightSender>,
}

impl Flight {
    fn finish(mut self, outcome: FlightOutcome, now: DateTime<Utc>, ttl: Duration) {
        lock_store(&self.store).complete(&self.key, &outcome, now, ttl);
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(outcome));
        }
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        if self.tx.is_some() {
            debug!(key = %self.key, "fetch dropped before completion");
            lock_store(&self.store).release(&self.key);
        }
    }
}
