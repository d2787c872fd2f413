//! Calendar-day identity used to bucket events.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::dates::local_date;

/// A date truncated to day granularity, stored as days since 1970-01-01.
///
/// Every instant on the same local calendar day maps to the same key, so the
/// index never depends on time of day or on a date string format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(i64);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        DayKey((date - NaiveDate::default()).num_days())
    }

    /// Key of the day `instant` falls on in `tz`.
    pub fn of(instant: &DateTime<Utc>, tz: &Tz) -> Self {
        Self::from_date(local_date(instant, tz))
    }

    pub fn epoch_day(self) -> i64 {
        self.0
    }

    pub fn date(self) -> NaiveDate {
        NaiveDate::default() + Duration::days(self.0)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey::from_date(date)
    }
}

impl From<DayKey> for NaiveDate {
    fn from(key: DayKey) -> Self {
        key.date()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.date().format("%Y-%m-%d"))
    }
}
