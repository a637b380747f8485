//! Month Range Module
//!
//! Calendar-month arithmetic and the lazy month sequence that drives a query plan.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::clock::{local_offset, Clock};
use crate::error::{ResaleError, Result};

// == Year Month ==
/// A calendar month, formatted as `yyyy-mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a YearMonth, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(ResaleError::InvalidInput(format!(
                "invalid year-month {}-{}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    /// Month containing `instant`, read in the dataset's UTC+8 zone.
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let local = instant.with_timezone(&local_offset());
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Midnight on the first day of this month at UTC+8.
    pub fn first_instant(&self) -> Result<DateTime<FixedOffset>> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|naive| local_offset().from_local_datetime(&naive).single())
            .ok_or_else(|| ResaleError::Internal(format!("no first instant for {}", self)))
    }
}

impl FromStr for YearMonth {
    type Err = ResaleError;

    /// Parses strictly `yyyy-mm`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ResaleError::InvalidInput(format!("expected yyyy-mm, got '{}'", s));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4
            || month.len() != 2
            || !year.bytes().all(|b| b.is_ascii_digit())
            || !month.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// == Month Range ==
/// Months from `start` up to, but excluding, the current month.
///
/// The upper bound is read from the clock every time iteration begins, so a
/// range iterated again after the month rolls over yields one more element.
#[derive(Clone)]
pub struct MonthRange {
    start: YearMonth,
    clock: Arc<dyn Clock>,
}

impl MonthRange {
    pub fn new(start: YearMonth, clock: Arc<dyn Clock>) -> Self {
        Self { start, clock }
    }

    /// Parses `start` as `yyyy-mm` and builds the range.
    pub fn parse(start: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self::new(start.parse()?, clock))
    }

    /// Starts a fresh pass over the range.
    pub fn iter(&self) -> MonthIter {
        MonthIter {
            next: self.start,
            end: YearMonth::containing(self.clock.now()),
        }
    }
}

impl fmt::Debug for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonthRange")
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a MonthRange {
    type Item = String;
    type IntoIter = MonthIter;

    fn into_iter(self) -> MonthIter {
        self.iter()
    }
}

/// One pass over a [`MonthRange`], yielding `yyyy-mm` strings.
#[derive(Debug, Clone)]
pub struct MonthIter {
    next: YearMonth,
    end: YearMonth,
}

impl Iterator for MonthIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next = current.succ();
        Some(current.to_string())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = months_between(self.next, self.end);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MonthIter {}

fn months_between(from: YearMonth, to: YearMonth) -> usize {
    let from = from.year as i64 * 12 + from.month as i64;
    let to = to.year as i64 * 12 + to.month as i64;
    (to - from).max(0) as usize
}
