//! Request DTOs for the resale query API
//!
//! Defines the query-string arguments of `GET /query` and their validation.

use serde::Deserialize;

use crate::error::{ResaleError, Result};
use crate::plan::YearMonth;

/// Earliest year accepted for a result month or lease commencement
pub const MIN_YEAR: i32 = 1960;

/// Separator between fields of a cache key
const KEY_SEPARATOR: char = '|';
const KEY_ESCAPE: char = '\\';

/// Query-string arguments for `GET /query`
///
/// All five fields are mandatory and kept exactly as received; the cache
/// key is derived from this raw text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryParams {
    /// Street name, e.g. `ANG MO KIO AVE 10`
    pub street_name: String,
    /// Flat type, e.g. `3 ROOM`
    pub flat_type: String,
    /// First month of results, `yyyy-mm`
    pub start_result_month: String,
    /// First lease commencement year, `yyyy`
    pub start_lease: String,
    /// Last lease commencement year, `yyyy`
    pub end_lease: String,
}

impl QueryParams {
    // == Cache Key ==
    /// Derives the cache key for this query.
    ///
    /// Fields are joined in a fixed order. Separator and escape characters
    /// inside a field are escaped, so keys are equal exactly when all five
    /// fields are textually identical.
    pub fn cache_key(&self) -> String {
        let fields = [
            &self.street_name,
            &self.flat_type,
            &self.start_lease,
            &self.end_lease,
            &self.start_result_month,
        ];

        let mut key = String::with_capacity(fields.iter().map(|f| f.len() + 1).sum());
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            for c in field.chars() {
                if c == KEY_SEPARATOR || c == KEY_ESCAPE {
                    key.push(KEY_ESCAPE);
                }
                key.push(c);
            }
        }
        key
    }

    // == Validate ==
    /// Parses and checks the arguments.
    ///
    /// A start month at or after the current month is accepted; it simply
    /// produces an empty plan.
    pub fn validate(&self) -> Result<ValidatedQuery> {
        if self.street_name.is_empty() {
            return Err(ResaleError::InvalidInput("street_name cannot be empty".to_string()));
        }
        if self.flat_type.is_empty() {
            return Err(ResaleError::InvalidInput("flat_type cannot be empty".to_string()));
        }

        let start_month: YearMonth = self.start_result_month.parse()?;
        if start_month.year() < MIN_YEAR {
            return Err(ResaleError::InvalidInput(format!(
                "start_result_month must not be before {}-01, got '{}'",
                MIN_YEAR, self.start_result_month
            )));
        }
        let start_lease = parse_year("start_lease", &self.start_lease)?;
        let end_lease = parse_year("end_lease", &self.end_lease)?;

        if start_lease > end_lease {
            return Err(ResaleError::InvalidInput(format!(
                "start_lease {} is after end_lease {}",
                start_lease, end_lease
            )));
        }

        Ok(ValidatedQuery {
            street_name: self.street_name.clone(),
            flat_type: self.flat_type.clone(),
            start_month,
            start_lease,
            end_lease,
        })
    }
}

fn parse_year(name: &str, raw: &str) -> Result<i32> {
    raw.parse::<i32>()
        .ok()
        .filter(|year| (MIN_YEAR..=9999).contains(year))
        .ok_or_else(|| {
            ResaleError::InvalidInput(format!(
                "{} must be a year from {}, got '{}'",
                name, MIN_YEAR, raw
            ))
        })
}

/// Query arguments after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub street_name: String,
    pub flat_type: String,
    pub start_month: YearMonth,
    pub start_lease: i32,
    pub end_lease: i32,
}
