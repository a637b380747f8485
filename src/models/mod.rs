//! Request, response and record models for the resale query API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod record;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use record::{PriceRecord, PriceValue, UpstreamRecord};
pub use requests::{QueryParams, ValidatedQuery};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
