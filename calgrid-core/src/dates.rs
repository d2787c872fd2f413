//! Calendar arithmetic shared by the grid, the window and the store.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// First day of the month containing `date`.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// Last day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    shift_months(date, 1) - Duration::days(1)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    end_of_month(date).day()
}

/// Start of the month `delta` months away from the month containing `date`.
/// Saturates at the edges of chrono's supported range.
pub fn shift_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let start = start_of_month(date);
    let shifted = if delta >= 0 {
        start.checked_add_months(Months::new(delta as u32))
    } else {
        start.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(start)
}

/// Whole calendar months from the month of `from` to the month of `to`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

/// Calendar date of an instant as seen in `tz`.
pub fn local_date(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Interpret a wall-clock time in `tz`.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant; times
/// inside a gap (clocks going forward) move one hour later.
pub fn localize(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// The instant `date` begins in `tz`.
pub fn local_midnight(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    localize(date.and_time(NaiveTime::MIN), tz)
}
