//! Batched Fan-Out Fetcher
//!
//! Runs a query plan against the upstream in fixed-size concurrent batches.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use super::{RawResponse, SearchFilter, Upstream};
use crate::plan::QueryPlan;

/// Issues a plan's requests `batch_size` at a time.
///
/// All requests of a batch run concurrently; the next batch starts only
/// once every request of the current one has finished.
#[derive(Clone)]
pub struct BatchedFetcher {
    upstream: Arc<dyn Upstream>,
    batch_size: usize,
}

impl BatchedFetcher {
    /// A batch size of zero is treated as one.
    pub fn new(upstream: Arc<dyn Upstream>, batch_size: usize) -> Self {
        Self {
            upstream,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fetches every request of `plan`, returning responses in plan order.
    pub async fn fetch(&self, plan: &QueryPlan) -> Vec<RawResponse> {
        let mut responses = Vec::with_capacity(plan.len());

        for (index, batch) in plan.requests.chunks(self.batch_size).enumerate() {
            debug!(batch = index, size = batch.len(), "issuing upstream batch");

            let calls = batch.iter().map(|request| {
                let filter = SearchFilter::new(plan, request);
                let upstream = Arc::clone(&self.upstream);
                async move { upstream.search(&filter).await }
            });

            responses.extend(join_all(calls).await);
        }

        responses
    }
}
