//! Result Aggregator
//!
//! Folds the raw responses of one plan into a single ordered record list,
//! or fails the whole fetch if any response is unusable.

use serde::Deserialize;
use tracing::warn;

use super::RawResponse;
use crate::error::{ResaleError, Result};
use crate::models::{PriceRecord, UpstreamRecord};
use crate::plan::RequestDescriptor;

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    records: Vec<UpstreamRecord>,
}

/// Concatenates the records of every response, in response order.
///
/// Any non-200 or transport failure fails the whole aggregation before
/// a single body is parsed; no partial list is ever returned.
pub fn aggregate(
    requests: &[RequestDescriptor],
    responses: Vec<RawResponse>,
) -> Result<Vec<PriceRecord>> {
    if requests.len() != responses.len() {
        return Err(ResaleError::Internal(format!(
            "{} responses for {} requests",
            responses.len(),
            requests.len()
        )));
    }

    let mut bodies = Vec::with_capacity(responses.len());
    for (request, response) in requests.iter().zip(responses) {
        match response {
            RawResponse::Completed { status: 200, body } => bodies.push((request, body)),
            RawResponse::Completed { status, .. } => {
                warn!(status, month = %request.month, lease = request.lease_year, "upstream rejected search");
                return Err(ResaleError::UpstreamFailure {
                    status,
                    month: request.month.clone(),
                    lease_year: request.lease_year,
                });
            }
            RawResponse::Transport { reason } => {
                return Err(ResaleError::TransportFailure {
                    month: request.month.clone(),
                    lease_year: request.lease_year,
                    reason,
                });
            }
        }
    }

    let mut records = Vec::new();
    for (request, body) in bodies {
        let envelope: SearchEnvelope = serde_json::from_str(&body).map_err(|e| {
            ResaleError::MalformedResponse(format!(
                "month {}, lease year {}: {}",
                request.month, request.lease_year, e
            ))
        })?;

        for record in &envelope.result.records {
            records.push(PriceRecord::from_upstream(record)?);
        }
    }

    Ok(records)
}
