//! Time source for the evidence pipeline.
//!
//! Day partitioning and rotation targets are derived from [`Clock::now`] on
//! every call; nothing caches "today".

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::{Mutex, PoisonError};

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current UTC calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// The UTC calendar date before today.
    fn yesterday(&self) -> NaiveDate {
        self.today().pred_opt().unwrap_or(NaiveDate::MIN)
    }
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_yesterday_across_month_boundary() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 1).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(clock.yesterday(), NaiveDate::from_ymd_opt(2025, 10, 31).unwrap());
    }

    #[test]
    fn test_advance_crosses_midnight() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 10, 16, 23, 59, 59).unwrap());
        clock.advance(Duration::seconds(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 10, 17).unwrap());
    }
}
