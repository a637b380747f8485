//! Resale Cache - cached fan-out query service for HDB resale prices
//!
//! Answers a price-history query by fanning out batched lookups to the
//! data.gov.sg datastore, aggregating the results, and caching them per
//! query with single-flight deduplication and time-based expiry.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod plan;
pub mod service;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use service::ResaleService;
