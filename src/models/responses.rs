//! Response DTOs for the resale query API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the health endpoint (GET /)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, always "ok"
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups that started an upstream fetch
    pub misses: u64,
    /// Lookups that waited on another caller's fetch
    pub coalesced: u64,
    /// Completed upstream fetches, successful or not
    pub fetches: u64,
    /// Fetches that ended in an error
    pub fetch_failures: u64,
    /// Current number of cached aggregates, fresh or stale
    pub total_entries: usize,
    /// Keys with a fetch currently running
    pub in_flight: usize,
    /// Share of lookups that did not start an upstream fetch
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            coalesced: stats.coalesced,
            fetches: stats.fetches,
            fetch_failures: stats.fetch_failures,
            total_entries: stats.total_entries,
            in_flight: stats.in_flight,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
