//! Clock Module
//!
//! Wall-clock abstraction so month ranges and cache expiry can be driven
//! deterministically in tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};

/// Offset of the dataset's local time zone (Singapore, UTC+8).
pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(UTC_PLUS_EIGHT_SECS).unwrap_or_else(|| Utc.fix())
}

const UTC_PLUS_EIGHT_SECS: i32 = 8 * 60 * 60;

// == Clock Trait ==
/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

// == System Clock ==
/// Clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// == Manual Clock ==
/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
