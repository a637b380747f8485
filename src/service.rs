//! Resale Service
//!
//! Answers one resale price query: validates it, derives its cache key, and
//! on a miss plans, fans out, and aggregates the upstream lookups.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::cache::{CacheStats, SharedRecords, SingleFlightCache};
use crate::clock::Clock;
use crate::config::{Config, DEFAULT_MAX_PLAN_REQUESTS};
use crate::error::{ResaleError, Result};
use crate::models::{PriceRecord, QueryParams, ValidatedQuery};
use crate::plan::QueryPlan;
use crate::upstream::{aggregate, BatchedFetcher, Upstream};

/// Longest TTL accepted from configuration (100 years)
const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Query front door shared by all HTTP handlers.
#[derive(Clone)]
pub struct ResaleService {
    cache: SingleFlightCache,
    fetcher: BatchedFetcher,
    clock: Arc<dyn Clock>,
    max_plan_requests: usize,
}

impl ResaleService {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        clock: Arc<dyn Clock>,
        batch_size: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            cache: SingleFlightCache::new(Arc::clone(&clock), ttl),
            fetcher: BatchedFetcher::new(upstream, batch_size),
            clock,
            max_plan_requests: DEFAULT_MAX_PLAN_REQUESTS,
        }
    }

    /// Caps how many upstream requests a single query may expand to.
    pub fn with_max_plan_requests(mut self, max: usize) -> Self {
        self.max_plan_requests = max.max(1);
        self
    }

    /// Creates a service with batch size and TTL taken from the Config.
    pub fn from_config(config: &Config, upstream: Arc<dyn Upstream>, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::seconds(config.cache_ttl.min(MAX_TTL_SECS) as i64);
        Self::new(upstream, clock, config.fetch_batch_size, ttl)
            .with_max_plan_requests(config.max_plan_requests)
    }

    // == Query ==
    /// Returns the aggregated price records for `params`.
    ///
    /// Invalid arguments, and queries that would plan more than
    /// `max_plan_requests` upstream calls, are rejected before the cache is
    /// consulted.
    pub async fn query(&self, params: &QueryParams) -> Result<SharedRecords> {
        let query = params.validate()?;

        let planned = QueryPlan::planned_len(&query, Arc::clone(&self.clock));
        if planned > self.max_plan_requests {
            warn!(planned, max = self.max_plan_requests, "query plan too large");
            return Err(ResaleError::InvalidInput(format!(
                "query expands to {} upstream requests, limit is {}",
                planned, self.max_plan_requests
            )));
        }

        let key = params.cache_key();

        self.cache.get_or_fetch(&key, || self.fetch(query)).await
    }

    async fn fetch(&self, query: ValidatedQuery) -> Result<Vec<PriceRecord>> {
        let plan = QueryPlan::build(&query, Arc::clone(&self.clock));
        info!(
            street = %plan.street_name,
            flat_type = %plan.flat_type,
            requests = plan.len(),
            batch_size = self.fetcher.batch_size(),
            "fetching from upstream"
        );

        let responses = self.fetcher.fetch(&plan).await;
        match aggregate(&plan.requests, responses) {
            Ok(records) => {
                info!(records = records.len(), "upstream fetch complete");
                Ok(records)
            }
            Err(e) => {
                warn!(error = %e, "upstream fetch failed");
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &SingleFlightCache {
        &self.cache
    }
}
