//! Cache Entry Module
//!
//! Defines a cached aggregate and its expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::models::PriceRecord;

/// Aggregated records shared between the cache and every caller served from it.
pub type SharedRecords = Arc<Vec<PriceRecord>>;

// == Cache Entry ==
/// One cached aggregate.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The aggregated records
    pub records: SharedRecords,
    /// First instant at which the entry is stale
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now` that lives for `ttl`.
    pub fn new(records: SharedRecords, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            records,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now` reaches `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
