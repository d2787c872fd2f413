//! Date range for loading events.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::dates::{end_of_month, local_midnight, start_of_month};

/// Half-open span of instants, `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        DateRange { from, to }
    }

    /// Local days `first..=last` in `tz`.
    pub fn days(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Self {
        DateRange {
            from: local_midnight(first, tz),
            to: local_midnight(last + Duration::days(1), tz),
        }
    }

    /// Whole months from the month of `first` through the month of `last`.
    pub fn months(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Self {
        Self::days(start_of_month(first), end_of_month(last), tz)
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.from <= *instant && *instant < self.to
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} .. {}", self.from.to_rfc3339(), self.to.to_rfc3339())
    }
}
