//! Cache Module
//!
//! Provides the time-bounded, single-flight cache of aggregated query results.

mod entry;
mod single_flight;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, SharedRecords};
pub use single_flight::SingleFlightCache;
pub use stats::CacheStats;
pub use store::{CacheStore, FlightOutcome, Slot};
