//! A month laid out as complete weeks, ready to render.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use chrono_tz::Tz;

use crate::date_range::DateRange;
use crate::dates::{end_of_month, start_of_month};
use crate::store::EventStore;

/// Anything that can say whether a day has events on it.
pub trait DayMarkers {
    fn has_events_on(&self, date: NaiveDate) -> bool;
}

impl DayMarkers for EventStore {
    fn has_events_on(&self, date: NaiveDate) -> bool {
        self.has_events(date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOptions {
    /// Weekday shown in the first column.
    pub week_start: Weekday,
    pub today: NaiveDate,
    pub selected: Option<NaiveDate>,
}

/// One day of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    /// False for days borrowed from the previous or next month.
    pub in_month: bool,
    pub has_event: bool,
    pub is_today: bool,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    month: NaiveDate,
    week_start: Weekday,
    weeks: Vec<[DayCell; 7]>,
}

/// Columns between `week_start` and `weekday`.
fn column_of(weekday: Weekday, week_start: Weekday) -> i64 {
    (weekday.num_days_from_monday() as i64 + 7 - week_start.num_days_from_monday() as i64) % 7
}

/// The seven column weekdays, starting at `week_start`.
pub fn weekday_headers(week_start: Weekday) -> [Weekday; 7] {
    let mut day = week_start;
    std::array::from_fn(|_| {
        let current = day;
        day = day.succ();
        current
    })
}

impl MonthGrid {
    /// Lay out the month containing `reference`.
    ///
    /// Rows run from the week containing the 1st to the week containing the
    /// last day, so a month has exactly as many rows as it needs (4 to 6).
    pub fn build(reference: NaiveDate, options: &GridOptions, markers: &impl DayMarkers) -> Self {
        let month = start_of_month(reference);
        let last = end_of_month(reference);
        let grid_start = month - Duration::days(column_of(month.weekday(), options.week_start));

        let cell_for = |date: NaiveDate| DayCell {
            date,
            day: date.day(),
            in_month: start_of_month(date) == month,
            has_event: markers.has_events_on(date),
            is_today: date == options.today,
            is_selected: options.selected == Some(date),
        };

        let mut weeks = Vec::with_capacity(6);
        let mut row_start = grid_start;
        while row_start <= last {
            weeks.push(std::array::from_fn(|col| {
                cell_for(row_start + Duration::days(col as i64))
            }));
            row_start += Duration::days(7);
        }

        MonthGrid {
            month,
            week_start: options.week_start,
            weeks,
        }
    }

    /// First day of the month this grid shows.
    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn headers(&self) -> [Weekday; 7] {
        weekday_headers(self.week_start)
    }

    pub fn weeks(&self) -> &[[DayCell; 7]] {
        &self.weeks
    }

    pub fn rows(&self) -> usize {
        self.weeks.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&DayCell> {
        self.weeks.get(row).and_then(|week| week.get(col))
    }

    pub fn cells(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flatten()
    }

    pub fn position_of(&self, date: NaiveDate) -> Option<(usize, usize)> {
        let offset = (date - self.first_date()).num_days();
        let index = usize::try_from(offset).ok()?;
        (index < self.rows() * 7).then_some((index / 7, index % 7))
    }

    pub fn first_date(&self) -> NaiveDate {
        self.weeks[0][0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.weeks[self.weeks.len() - 1][6].date
    }

    /// Every instant the grid shows, leading and trailing days included.
    pub fn range(&self, tz: &Tz) -> DateRange {
        DateRange::days(self.first_date(), self.last_date(), tz)
    }
}
