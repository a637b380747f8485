//! API Module
//!
//! HTTP handlers and routing for the resale query REST API.
//!
//! # Endpoints
//! - `GET /` - Health check
//! - `GET /query` - Aggregated resale prices
//! - `GET /stats` - Cache statistics

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
