//! Error types for the resale query service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Resale Error Enum ==
/// Unified error type for the resale query service.
///
/// Cloneable so a single fetch failure can be handed to every caller
/// that was waiting on the same flight.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResaleError {
    /// Missing or malformed query argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An upstream request completed with a non-200 status
    #[error("Upstream returned status {status} for month {month}, lease year {lease_year}")]
    UpstreamFailure {
        status: u16,
        month: String,
        lease_year: i32,
    },

    /// An upstream request failed before a response was received
    #[error("Upstream request failed for month {month}, lease year {lease_year}: {reason}")]
    TransportFailure {
        month: String,
        lease_year: i32,
        reason: String,
    },

    /// Upstream answered 200 but the body was not in the expected shape
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResaleError {
    fn status_code(&self) -> StatusCode {
        match self {
            ResaleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ResaleError::UpstreamFailure { .. }
            | ResaleError::TransportFailure { .. }
            | ResaleError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            ResaleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ResaleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the resale query service.
pub type Result<T> = std::result::Result<T, ResaleError>;
