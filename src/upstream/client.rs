//! Datastore search client.
//!
//! Issues one GET per filter against the CKAN `datastore_search` endpoint.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{RawResponse, SearchFilter, Upstream};
use crate::error::{ResaleError, Result};

/// Sort directive sent with every search
pub const SORT_ORDER: &str = "month desc";

/// reqwest-backed client for the datastore search API.
#[derive(Debug, Clone)]
pub struct DatastoreClient {
    client: reqwest::Client,
    url: String,
    resource_id: String,
}

impl DatastoreClient {
    pub fn new(url: impl Into<String>, resource_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("resale_cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResaleError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            resource_id: resource_id.into(),
        })
    }
}

#[async_trait]
impl Upstream for DatastoreClient {
    async fn search(&self, filter: &SearchFilter) -> RawResponse {
        let q = match serde_json::to_string(filter) {
            Ok(q) => q,
            Err(e) => {
                return RawResponse::Transport {
                    reason: format!("failed to encode filter: {}", e),
                }
            }
        };

        debug!(month = %filter.month, lease = %filter.lease_commence_date, "datastore search");

        let resp = match self
            .client
            .get(&self.url)
            .query(&[
                ("q", q.as_str()),
                ("resource_id", self.resource_id.as_str()),
                ("sort", SORT_ORDER),
            ])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(month = %filter.month, error = %e, "datastore request failed");
                return RawResponse::Transport {
                    reason: e.to_string(),
                };
            }
        };

        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(body) => RawResponse::Completed { status, body },
            Err(e) => {
                warn!(month = %filter.month, error = %e, "failed to read datastore body");
                RawResponse::Transport {
                    reason: e.to_string(),
                }
            }
        }
    }
}
