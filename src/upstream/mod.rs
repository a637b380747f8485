//! Upstream Module
//!
//! Everything that talks to the datastore search API: the client, the
//! batched fan-out over a query plan, and aggregation of the raw responses.

mod aggregate;
mod client;
mod fetcher;

use async_trait::async_trait;
use serde::Serialize;

use crate::plan::{QueryPlan, RequestDescriptor};

pub use aggregate::aggregate;
pub use client::{DatastoreClient, SORT_ORDER};
pub use fetcher::BatchedFetcher;

// == Search Filter ==
/// Filter object sent JSON-encoded as the `q` parameter of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFilter {
    pub street_name: String,
    pub month: String,
    /// Lease commencement year, stringified
    pub lease_commence_date: String,
    pub flat_type: String,
}

impl SearchFilter {
    pub fn new(plan: &QueryPlan, request: &RequestDescriptor) -> Self {
        Self {
            street_name: plan.street_name.clone(),
            month: request.month.clone(),
            lease_commence_date: request.lease_year.to_string(),
            flat_type: plan.flat_type.clone(),
        }
    }
}

// == Raw Response ==
/// Outcome of one upstream call, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResponse {
    /// The server answered; status may be anything
    Completed { status: u16, body: String },
    /// No usable answer: connection, TLS or body-read failure
    Transport { reason: String },
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        RawResponse::Completed {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RawResponse::Completed { status: 200, .. })
    }
}

// == Upstream Trait ==
/// A datastore that answers one filtered search.
///
/// Implementations never fail: transport problems are reported as
/// [`RawResponse::Transport`] so one bad call cannot abort a batch.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn search(&self, filter: &SearchFilter) -> RawResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_filter_json() {
        let plan = QueryPlan {
            street_name: "ANG MO KIO AVE 10".to_string(),
            flat_type: "3 ROOM".to_string(),
            requests: vec![],
        };
        let request = RequestDescriptor {
            month: "2023-01".to_string(),
            lease_year: 2015,
        };
        let json = serde_json::to_value(SearchFilter::new(&plan, &request)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "street_name": "ANG MO KIO AVE 10",
                "month": "2023-01",
                "lease_commence_date": "2015",
                "flat_type": "3 ROOM",
            })
        );
    }

    #[test]
    fn test_raw_response_success() {
        assert!(RawResponse::ok("{}").is_success());
        assert!(!RawResponse::Completed {
            status: 201,
            body: String::new()
        }
        .is_success());
        assert!(!RawResponse::Transport {
            reason: "reset".to_string()
        }
        .is_success());
    }
}
