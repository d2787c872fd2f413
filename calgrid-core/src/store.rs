//! In-memory event index bucketed by calendar day.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::date_range::DateRange;
use crate::dates::local_midnight;
use crate::day_key::DayKey;
use crate::error::{CalGridError, CalGridResult};
use crate::event::{Event, EventId};
use crate::remote::{EventGateway, Listing};

/// Events grouped under the local day they start on.
///
/// Buckets keep insertion order until [`EventStore::sort_for`] is called for
/// that day. A key exists only while its bucket is non-empty.
#[derive(Debug, Clone)]
pub struct EventStore {
    tz: Tz,
    buckets: BTreeMap<DayKey, Vec<Event>>,
}

impl EventStore {
    pub fn new(tz: Tz) -> Self {
        EventStore {
            tz,
            buckets: BTreeMap::new(),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn key_for(&self, instant: &DateTime<Utc>) -> DayKey {
        DayKey::of(instant, &self.tz)
    }

    pub fn day_key_of(&self, event: &Event) -> DayKey {
        self.key_for(&event.start())
    }

    /// Append to the bucket of the event's start day. Does not de-duplicate.
    pub fn add(&mut self, event: Event) {
        let key = self.day_key_of(&event);
        self.buckets.entry(key).or_default().push(event);
    }

    /// Remove the first event with the same id from the event's start-day bucket.
    pub fn remove(&mut self, event: &Event) -> bool {
        let key = self.day_key_of(event);
        let Some(bucket) = self.buckets.get_mut(&key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|e| e.id() == event.id()) else {
            return false;
        };

        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        true
    }

    /// Swap an edited event in, moving it to a new bucket if its start day changed.
    pub fn replace(&mut self, old: &Event, new: Event) {
        self.remove(old);
        self.add(new);
    }

    pub fn count_for(&self, day: impl Into<DayKey>) -> usize {
        self.buckets.get(&day.into()).map_or(0, Vec::len)
    }

    /// Like `count_for`, counting 0 when no day is selected.
    pub fn count_for_selected(&self, day: Option<NaiveDate>) -> usize {
        day.map_or(0, |day| self.count_for(day))
    }

    pub fn has_events(&self, day: impl Into<DayKey>) -> bool {
        self.count_for(day) > 0
    }

    /// The event at `row` of the day's bucket.
    pub fn event_at(&self, day: impl Into<DayKey>, row: usize) -> CalGridResult<&Event> {
        let day = day.into();
        let bucket = self.events_on(day);
        bucket.get(row).ok_or(CalGridError::RowOutOfRange {
            day,
            row,
            len: bucket.len(),
        })
    }

    pub fn events_on(&self, day: impl Into<DayKey>) -> &[Event] {
        self.buckets
            .get(&day.into())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find(&self, id: EventId) -> Option<&Event> {
        self.buckets
            .values()
            .flatten()
            .find(|event| event.id() == Some(id))
    }

    /// Order the day's bucket by start time. Stable, so equal starts keep
    /// insertion order.
    pub fn sort_for(&mut self, day: impl Into<DayKey>) {
        if let Some(bucket) = self.buckets.get_mut(&day.into()) {
            bucket.sort_by_key(|event| event.start());
        }
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Drop the buckets of every day from the one containing `range.from` up
    /// to the day starting at `range.to`. Returns how many events went.
    pub fn remove_range(&mut self, range: &DateRange) -> usize {
        let first = self.key_for(&range.from);
        let keys: Vec<DayKey> = self
            .buckets
            .range(first..)
            .map(|(key, _)| *key)
            .take_while(|key| self.day_starts_before(*key, &range.to))
            .collect();

        let removed = keys
            .iter()
            .filter_map(|key| self.buckets.remove(key))
            .map(|bucket| bucket.len())
            .sum();

        if removed > 0 {
            debug!("Dropped {} events in {}", removed, range);
        }
        removed
    }

    fn day_starts_before(&self, key: DayKey, instant: &DateTime<Utc>) -> bool {
        local_midnight(key.date(), &self.tz) < *instant
    }

    /// Add the listed events that start inside `range`.
    ///
    /// Returns how many were added. If the listing rejected malformed
    /// records, the valid ones are still kept and `PartialLoad` is returned.
    pub fn ingest(&mut self, range: &DateRange, listing: Listing) -> CalGridResult<usize> {
        let mut added = 0;
        for event in listing.events {
            if !range.contains(&event.start()) {
                debug!("Skipping event outside {}: {}", range, event);
                continue;
            }
            self.add(event);
            added += 1;
        }

        if listing.rejected.is_empty() {
            Ok(added)
        } else {
            Err(CalGridError::PartialLoad {
                added,
                rejected: listing.rejected.len(),
            })
        }
    }

    /// Fetch events starting in `range` from the gateway and add them.
    pub async fn load_range<G: EventGateway>(
        &mut self,
        gateway: &G,
        range: &DateRange,
    ) -> CalGridResult<usize> {
        let listing = gateway.list(Some(range)).await?;
        self.ingest(range, listing)
    }

    /// Total number of events.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Days that have at least one event, in order.
    pub fn days(&self) -> impl Iterator<Item = DayKey> + '_ {
        self.buckets.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryGateway;
    use crate::remote::protocol::WireEvent;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: EventId, title: &str, start: DateTime<Utc>) -> Event {
        Event::new(title, start, start + chrono::Duration::hours(1))
            .unwrap()
            .with_id(id)
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    #[test]
    fn add_buckets_by_start_day() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "Review", at(5, 14)));

        assert_eq!(store.count_for(day(2024, 3, 5)), 1);
        assert_eq!(store.count_for(day(2024, 3, 6)), 0);
        assert_eq!(store.event_at(day(2024, 3, 5), 0).unwrap().title(), "Review");
    }

    #[test]
    fn add_does_not_deduplicate() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "Twice", at(5, 9)));
        store.add(event(1, "Twice", at(5, 9)));
        assert_eq!(store.count_for(day(2024, 3, 5)), 2);
    }

    #[test]
    fn removing_last_event_clears_key() {
        let mut store = EventStore::new(Tz::UTC);
        let only = event(1, "Solo", at(5, 9));
        store.add(only.clone());

        assert!(store.remove(&only));
        assert_eq!(store.count_for(day(2024, 3, 5)), 0);
        assert!(store.is_empty());
        assert_eq!(store.days().count(), 0);
    }

    #[test]
    fn remove_is_noop_for_unknown_event() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "Kept", at(5, 9)));

        assert!(!store.remove(&event(2, "Other id", at(5, 9))));
        assert!(!store.remove(&event(1, "Other day", at(6, 9))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn event_at_out_of_range_is_an_error() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "Only", at(5, 9)));

        assert!(matches!(
            store.event_at(day(2024, 3, 5), 1),
            Err(CalGridError::RowOutOfRange { row: 1, len: 1, .. })
        ));
        assert!(matches!(
            store.event_at(day(2024, 3, 9), 0),
            Err(CalGridError::RowOutOfRange { len: 0, .. })
        ));
    }

    #[test]
    fn unset_selection_counts_zero() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "Any", at(5, 9)));
        assert_eq!(store.count_for_selected(None), 0);
        assert_eq!(store.count_for_selected(Some(day(2024, 3, 5))), 1);
    }

    #[test]
    fn sort_for_orders_by_start_and_is_idempotent() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "Late", at(5, 18)));
        store.add(event(2, "Early", at(5, 8)));
        store.add(event(3, "Noon", at(5, 12)));

        store.sort_for(day(2024, 3, 5));
        let once: Vec<_> = store.events_on(day(2024, 3, 5)).to_vec();
        assert!(once.windows(2).all(|w| w[0].start() <= w[1].start()));
        assert_eq!(once[0].title(), "Early");

        store.sort_for(day(2024, 3, 5));
        assert_eq!(store.events_on(day(2024, 3, 5)), once.as_slice());
    }

    #[test]
    fn sort_is_not_automatic() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "Late", at(5, 18)));
        store.add(event(2, "Early", at(5, 8)));
        assert_eq!(store.event_at(day(2024, 3, 5), 0).unwrap().title(), "Late");
    }

    #[test]
    fn replace_moves_event_between_days() {
        let mut store = EventStore::new(Tz::UTC);
        let old = event(1, "Moved", at(5, 9));
        store.add(old.clone());

        let new = event(1, "Moved", at(7, 9));
        store.replace(&old, new);

        assert_eq!(store.count_for(day(2024, 3, 5)), 0);
        assert_eq!(store.count_for(day(2024, 3, 7)), 1);
    }

    #[test]
    fn day_follows_store_zone() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        let mut store = EventStore::new(tokyo);
        store.add(event(1, "Late UTC", at(5, 20)));

        assert_eq!(store.count_for(day(2024, 3, 6)), 1);
        assert_eq!(store.count_for(day(2024, 3, 5)), 0);
    }

    #[test]
    fn find_searches_every_bucket() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "First", at(5, 9)));
        store.add(event(2, "Second", at(9, 9)));

        assert_eq!(store.find(2).map(Event::title), Some("Second"));
        assert!(store.find(3).is_none());
    }

    #[test]
    fn remove_range_drops_whole_days_in_span() {
        let mut store = EventStore::new(Tz::UTC);
        store.add(event(1, "Before", at(4, 23)));
        store.add(event(2, "In", at(5, 0)));
        store.add(event(3, "In too", at(6, 22)));
        store.add(event(4, "After", at(7, 0)));

        let range = DateRange::days(day(2024, 3, 5), day(2024, 3, 6), &Tz::UTC);
        assert_eq!(store.remove_range(&range), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.count_for(day(2024, 3, 4)), 1);
        assert_eq!(store.count_for(day(2024, 3, 7)), 1);
    }

    #[test]
    fn ingest_skips_events_outside_range() {
        let mut store = EventStore::new(Tz::UTC);
        let range = DateRange::days(day(2024, 3, 5), day(2024, 3, 5), &Tz::UTC);
        let listing = Listing {
            events: vec![event(1, "In", at(5, 9)), event(2, "Next day", at(6, 0))],
            rejected: vec![],
        };

        assert_eq!(store.ingest(&range, listing).unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn load_range_then_remove() {
        let gateway = MemoryGateway::with_events([
            Event::new("A", at(5, 9), at(5, 10)).unwrap(),
            Event::new("B", at(5, 11), at(5, 12)).unwrap(),
        ]);
        let mut store = EventStore::new(Tz::UTC);
        let range = DateRange::days(day(2024, 3, 1), day(2024, 3, 31), &Tz::UTC);

        assert_eq!(store.load_range(&gateway, &range).await.unwrap(), 2);
        assert_eq!(store.count_for(day(2024, 3, 5)), 2);

        let a = store.event_at(day(2024, 3, 5), 0).unwrap().clone();
        assert_eq!(a.id(), Some(1));
        store.remove(&a);

        assert_eq!(store.count_for(day(2024, 3, 5)), 1);
        assert_eq!(store.event_at(day(2024, 3, 5), 0).unwrap().id(), Some(2));
    }

    #[tokio::test]
    async fn load_range_keeps_partial_results() {
        let gateway = MemoryGateway::with_events([Event::new("Good", at(5, 9), at(5, 10)).unwrap()]);
        gateway.seed_raw(WireEvent {
            id: -1,
            title: Some("No end".into()),
            start_date: Some("2024-03-05 12:00:00".into()),
            end_date: None,
        });
        let mut store = EventStore::new(Tz::UTC);
        let range = DateRange::days(day(2024, 3, 1), day(2024, 3, 31), &Tz::UTC);

        let err = store.load_range(&gateway, &range).await.unwrap_err();
        assert!(matches!(err, CalGridError::PartialLoad { added: 1, rejected: 1 }));
        assert_eq!(store.count_for(day(2024, 3, 5)), 1);
    }

    #[tokio::test]
    async fn load_range_network_failure_adds_nothing() {
        let gateway = MemoryGateway::with_events([Event::new("A", at(5, 9), at(5, 10)).unwrap()]);
        gateway.fail_next("timeout");
        let mut store = EventStore::new(Tz::UTC);
        let range = DateRange::days(day(2024, 3, 1), day(2024, 3, 31), &Tz::UTC);

        assert!(store.load_range(&gateway, &range).await.unwrap_err().is_network());
        assert!(store.is_empty());
    }
}
