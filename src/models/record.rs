//! Price Record Model
//!
//! One resale transaction as returned to clients, plus the upstream record
//! shape it is normalized from.

use serde::{Deserialize, Serialize};

use crate::error::{ResaleError, Result};
use crate::plan::YearMonth;

// == Price Record ==
/// A resale price at the start of a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// RFC 3339 instant of the first day of the month, 00:00 at UTC+8
    pub time: String,
    /// Resale price
    pub price: f64,
}

impl PriceRecord {
    /// Normalizes a raw upstream record.
    pub fn from_upstream(record: &UpstreamRecord) -> Result<Self> {
        let month: YearMonth = record.month.parse().map_err(|_| {
            ResaleError::MalformedResponse(format!("record month '{}' is not yyyy-mm", record.month))
        })?;

        Ok(Self {
            time: month.first_instant()?.to_rfc3339(),
            price: record.resale_price.as_f64()?,
        })
    }
}

// == Upstream Record ==
/// Fields of a datastore record that the service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamRecord {
    pub month: String,
    pub resale_price: PriceValue,
}

/// The datastore reports prices as either numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    /// Rejects anything that is not a finite number, including `NaN` and
    /// `inf` spelled as strings.
    pub fn as_f64(&self) -> Result<f64> {
        let value = match self {
            PriceValue::Number(n) => Some(*n),
            PriceValue::Text(s) => s.trim().parse::<f64>().ok(),
        };

        value.filter(|v| v.is_finite()).ok_or_else(|| {
            ResaleError::MalformedResponse(format!("resale_price {:?} is not a finite number", self))
        })
    }
}
