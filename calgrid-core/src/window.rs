//! The run of months a scrolling month view has materialized.
//!
//! Month dates are cheap and the window only ever grows. Event data is what
//! costs memory, so each month also tracks whether its events are resident,
//! and months far from the visible one are evicted once more than
//! `resident_months` are held.

use std::collections::{BTreeMap, VecDeque};
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::debug;

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_EDGE_MARGIN, DEFAULT_RESIDENT_MONTHS};
use crate::date_range::DateRange;
use crate::dates::{months_between, shift_months, start_of_month};
use crate::error::{CalGridError, CalGridResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Idle,
    /// Events for months just added at this edge are on their way.
    LoadingEdge(Direction),
}

/// Whether a month's events are in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    Unloaded,
    /// Requested by the load with this sequence number.
    Loading(u64),
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Months added per edge extension.
    pub batch_size: usize,
    /// Extend when the visible month is this close to an edge.
    pub edge_margin: usize,
    /// Soft cap on months with events in the store.
    pub resident_months: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            edge_margin: DEFAULT_EDGE_MARGIN,
            resident_months: DEFAULT_RESIDENT_MONTHS,
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> CalGridResult<()> {
        if self.batch_size == 0 {
            return Err(CalGridError::Config("batch_size must be at least 1".into()));
        }
        if self.batch_size <= self.edge_margin {
            return Err(CalGridError::Config(format!(
                "batch_size ({}) must be greater than edge_margin ({})",
                self.batch_size, self.edge_margin
            )));
        }
        if self.resident_months == 0 {
            return Err(CalGridError::Config("resident_months must be at least 1".into()));
        }
        Ok(())
    }
}

/// Events to fetch for a contiguous run of months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub seq: u64,
    pub first_month: NaiveDate,
    pub last_month: NaiveDate,
    pub range: DateRange,
    /// Set when the months were just added at an edge.
    pub direction: Option<Direction>,
}

/// What a visit changed and what the caller has to do about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowVisit {
    /// Visible index after any months were prepended.
    pub index: usize,
    /// Months prepended; the caller's index into the old window moves by this.
    pub shifted: usize,
    pub loads: Vec<LoadRequest>,
    /// Spans whose events should be dropped from the store.
    pub evicted: Vec<DateRange>,
}

#[derive(Debug, Clone)]
struct MonthSlot {
    start: NaiveDate,
    residency: Residency,
}

#[derive(Debug, Clone)]
pub struct MonthWindow {
    tz: Tz,
    config: WindowConfig,
    months: VecDeque<MonthSlot>,
    anchor: NaiveDate,
    next_seq: u64,
    /// Outstanding edge loads by sequence number.
    edge_loads: BTreeMap<u64, Direction>,
}

/// Split sorted indices into runs of consecutive values.
fn runs(indices: &[usize]) -> Vec<RangeInclusive<usize>> {
    let mut runs: Vec<RangeInclusive<usize>> = Vec::new();
    for &i in indices {
        match runs.last_mut() {
            Some(run) if *run.end() + 1 == i => *run = *run.start()..=i,
            _ => runs.push(i..=i),
        }
    }
    runs
}

impl MonthWindow {
    /// Window of `batch_size` months either side of the month of `anchor`.
    pub fn new(anchor: NaiveDate, tz: Tz, config: WindowConfig) -> CalGridResult<Self> {
        config.validate()?;

        let anchor = start_of_month(anchor);
        let batch = config.batch_size as i32;
        let months = (-batch..=batch)
            .map(|delta| MonthSlot {
                start: shift_months(anchor, delta),
                residency: Residency::Unloaded,
            })
            .collect();

        Ok(MonthWindow {
            tz,
            config,
            months,
            anchor,
            next_seq: 0,
            edge_loads: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn months(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.months.iter().map(|slot| slot.start)
    }

    pub fn month_at(&self, index: usize) -> Option<NaiveDate> {
        self.months.get(index).map(|slot| slot.start)
    }

    pub fn residency(&self, index: usize) -> Option<Residency> {
        self.months.get(index).map(|slot| slot.residency)
    }

    /// Index of the month containing `date`, if the window reaches it.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let first = self.months.front()?.start;
        let index = usize::try_from(months_between(first, date)).ok()?;
        (index < self.len()).then_some(index)
    }

    /// Index of the month the window was opened on.
    pub fn anchor_index(&self) -> usize {
        self.index_of(self.anchor).unwrap_or(0)
    }

    pub fn state(&self) -> WindowState {
        match self.edge_loads.values().next_back() {
            Some(direction) => WindowState::LoadingEdge(*direction),
            None => WindowState::Idle,
        }
    }

    /// Months with events in the store or on their way.
    pub fn resident_count(&self) -> usize {
        self.months
            .iter()
            .filter(|slot| slot.residency != Residency::Unloaded)
            .count()
    }

    pub fn pending_loads(&self) -> usize {
        let mut seqs: Vec<u64> = self
            .months
            .iter()
            .filter_map(|slot| match slot.residency {
                Residency::Loading(seq) => Some(seq),
                _ => None,
            })
            .collect();
        seqs.dedup();
        seqs.len()
    }

    /// The visible month is now `index`: extend near the edges, plan loads
    /// for months near it that have no events yet, and evict far-off months.
    pub fn visit(&mut self, index: usize) -> WindowVisit {
        let batch = self.config.batch_size;
        let margin = self.config.edge_margin;
        let mut index = index.min(self.len().saturating_sub(1));
        let mut visit = WindowVisit::default();
        let mut edge: Vec<(RangeInclusive<usize>, Direction)> = Vec::new();

        if index <= margin {
            self.extend(Direction::Backward);
            index += batch;
            visit.shifted = batch;
            edge.push((0..=batch - 1, Direction::Backward));
        }
        if self.len() - 1 - index <= margin {
            self.extend(Direction::Forward);
            edge.push((self.len() - batch..=self.len() - 1, Direction::Forward));
        }
        visit.index = index;

        let hot = self.hot_span(index);
        let wanted: Vec<usize> = (0..self.len())
            .filter(|i| self.months[*i].residency == Residency::Unloaded)
            .filter(|i| hot.contains(i) || edge.iter().any(|(span, _)| span.contains(i)))
            .collect();

        for run in runs(&wanted) {
            let direction = edge
                .iter()
                .find(|(span, _)| span.contains(run.start()) || span.contains(run.end()))
                .map(|(_, direction)| *direction);
            visit.loads.push(self.request(run, direction));
        }

        visit.evicted = self.evict(index);
        visit
    }

    /// Record the outcome of load `seq`. Returns false for a stale or
    /// unknown sequence number, in which case nothing changes.
    ///
    /// Failed months go back to unloaded so the next visit asks again; the
    /// months themselves stay in the window.
    pub fn complete(&mut self, seq: u64, succeeded: bool) -> bool {
        let mut matched = false;
        for slot in self.months.iter_mut() {
            if slot.residency == Residency::Loading(seq) {
                slot.residency = if succeeded {
                    Residency::Loaded
                } else {
                    Residency::Unloaded
                };
                matched = true;
            }
        }
        self.edge_loads.remove(&seq);
        matched
    }

    /// Whether a response for `seq` should still be applied.
    pub fn is_current(&self, seq: u64) -> bool {
        self.months
            .iter()
            .any(|slot| slot.residency == Residency::Loading(seq))
    }

    /// Forget all event data and every load in flight.
    pub fn reset(&mut self) {
        for slot in self.months.iter_mut() {
            slot.residency = Residency::Unloaded;
        }
        self.edge_loads.clear();
    }

    fn extend(&mut self, direction: Direction) {
        for _ in 0..self.config.batch_size {
            match direction {
                Direction::Backward => {
                    let first = self.months.front().map_or(self.anchor, |slot| slot.start);
                    self.months.push_front(MonthSlot {
                        start: shift_months(first, -1),
                        residency: Residency::Unloaded,
                    });
                }
                Direction::Forward => {
                    let last = self.months.back().map_or(self.anchor, |slot| slot.start);
                    self.months.push_back(MonthSlot {
                        start: shift_months(last, 1),
                        residency: Residency::Unloaded,
                    });
                }
            }
        }
        debug!("Extended month window {:?} to {} months", direction, self.len());
    }

    /// Months close enough to the visible one that their events must be loaded.
    fn hot_span(&self, index: usize) -> RangeInclusive<usize> {
        let radius = self.config.batch_size;
        index.saturating_sub(radius)..=(index + radius).min(self.len() - 1)
    }

    fn request(&mut self, run: RangeInclusive<usize>, direction: Option<Direction>) -> LoadRequest {
        let seq = self.next_seq;
        self.next_seq += 1;

        for i in run.clone() {
            self.months[i].residency = Residency::Loading(seq);
        }
        if let Some(direction) = direction {
            self.edge_loads.insert(seq, direction);
        }

        let first_month = self.months[*run.start()].start;
        let last_month = self.months[*run.end()].start;
        LoadRequest {
            seq,
            first_month,
            last_month,
            range: DateRange::months(first_month, last_month, &self.tz),
            direction,
        }
    }

    fn evict(&mut self, index: usize) -> Vec<DateRange> {
        let hot = self.hot_span(index);
        let mut evicted = Vec::new();

        while self.resident_count() > self.config.resident_months {
            let farthest = (0..self.len())
                .filter(|i| !hot.contains(i) && self.months[*i].residency == Residency::Loaded)
                .max_by_key(|i| i.abs_diff(index));
            let Some(i) = farthest else {
                break;
            };
            self.months[i].residency = Residency::Unloaded;
            evicted.push(i);
        }

        evicted.sort_unstable();
        runs(&evicted)
            .into_iter()
            .map(|run| {
                let first = self.months[*run.start()].start;
                let last = self.months[*run.end()].start;
                debug!("Evicting events for {} through {}", first, last);
                DateRange::months(first, last, &self.tz)
            })
            .collect()
    }
}
