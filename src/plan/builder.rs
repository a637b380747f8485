//! Query Plan Builder
//!
//! Expands one validated query into the upstream requests that answer it.

use std::sync::Arc;

use crate::clock::Clock;
use crate::models::ValidatedQuery;
use crate::plan::MonthRange;

// == Request Descriptor ==
/// One upstream lookup: a single month and lease commencement year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Month of sale, `yyyy-mm`
    pub month: String,
    /// Lease commencement year
    pub lease_year: i32,
}

// == Query Plan ==
/// Ordered upstream requests for one query, sharing its street and flat type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub street_name: String,
    pub flat_type: String,
    pub requests: Vec<RequestDescriptor>,
}

impl QueryPlan {
    /// Builds the months × lease years product, months outer.
    ///
    /// A start month at or after the current month gives an empty plan.
    pub fn build(query: &ValidatedQuery, clock: Arc<dyn Clock>) -> Self {
        let months = MonthRange::new(query.start_month, clock);
        let lease_years = query.start_lease..=query.end_lease;

        let requests = months
            .iter()
            .flat_map(|month| {
                lease_years.clone().map(move |lease_year| RequestDescriptor {
                    month: month.clone(),
                    lease_year,
                })
            })
            .collect();

        Self {
            street_name: query.street_name.clone(),
            flat_type: query.flat_type.clone(),
            requests,
        }
    }

    /// Number of requests `build` would produce right now, computed without
    /// materializing them.
    pub fn planned_len(query: &ValidatedQuery, clock: Arc<dyn Clock>) -> usize {
        let months = MonthRange::new(query.start_month, clock).iter().len();
        let lease_years = (query.end_lease - query.start_lease + 1).max(0) as usize;
        months.saturating_mul(lease_years)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
