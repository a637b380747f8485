//! API Handlers
//!
//! HTTP request handlers for each endpoint of the resale query service.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::cache::SharedRecords;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{ResaleError, Result};
use crate::models::{HealthResponse, QueryParams, StatsResponse};
use crate::service::ResaleService;
use crate::upstream::Upstream;

/// Application state shared across all handlers.
///
/// Holds the one service instance, and through it the process-wide cache.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ResaleService>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(service: ResaleService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Creates a new AppState from configuration, using the system clock.
    pub fn from_config(config: &Config, upstream: Arc<dyn Upstream>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::new(ResaleService::from_config(config, upstream, clock))
    }
}

/// Handler for GET /query
///
/// Returns the resale price records matching the query-string arguments.
/// All five arguments are required.
pub async fn query_handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<SharedRecords>> {
    let Query(params) = params.map_err(|rejection| ResaleError::InvalidInput(rejection.body_text()))?;

    let records = state.service.query(&params).await?;
    Ok(Json(records))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.stats().into())
}

/// Handler for GET /
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
