//! Plan Module
//!
//! Turns a validated query into the ordered list of upstream requests.

mod builder;
mod months;

pub use builder::{QueryPlan, RequestDescriptor};
pub use months::{MonthIter, MonthRange, YearMonth};
