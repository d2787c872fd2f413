//! A calendar session: the event store and month window behind one gateway.
//!
//! The session is the only writer of its store and window. Gateway calls are
//! awaited outside of any borrow of either, and their results are applied
//! through `&mut self`.

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::dates::local_date;
use crate::error::{CalGridResult, ValidationError};
use crate::event::{Event, EventId};
use crate::form::EventForm;
use crate::month_grid::{GridOptions, MonthGrid};
use crate::remote::{EventGateway, Listing};
use crate::store::EventStore;
use crate::window::{LoadRequest, MonthWindow, Residency, WindowConfig, WindowVisit};

pub struct CalendarSession<G> {
    gateway: G,
    store: EventStore,
    window: MonthWindow,
    visible: usize,
    selected: Option<NaiveDate>,
    today: NaiveDate,
    week_start: Weekday,
}

impl<G: EventGateway> CalendarSession<G> {
    /// Open on the month of `today`. Nothing is loaded until the first visit.
    pub fn new(
        gateway: G,
        tz: Tz,
        week_start: Weekday,
        today: NaiveDate,
        config: WindowConfig,
    ) -> CalGridResult<Self> {
        Self::anchored(gateway, tz, week_start, today, today, config)
    }

    /// Open on the month of `anchor` instead of today's.
    pub fn anchored(
        gateway: G,
        tz: Tz,
        week_start: Weekday,
        today: NaiveDate,
        anchor: NaiveDate,
        config: WindowConfig,
    ) -> CalGridResult<Self> {
        let window = MonthWindow::new(anchor, tz, config)?;
        let visible = window.anchor_index();

        Ok(CalendarSession {
            gateway,
            store: EventStore::new(tz),
            window,
            visible,
            selected: None,
            today,
            week_start,
        })
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn window(&self) -> &MonthWindow {
        &self.window
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn visible_index(&self) -> usize {
        self.visible
    }

    pub fn visible_month(&self) -> Option<NaiveDate> {
        self.window.month_at(self.visible)
    }

    /// Move to `index` and plan the loads it needs. Evicted months are
    /// dropped from the store here; loads are left to the caller, who hands
    /// each result to [`CalendarSession::finish_load`].
    pub fn visit(&mut self, index: usize) -> WindowVisit {
        let visit = self.window.visit(index);
        for range in &visit.evicted {
            self.store.remove_range(range);
        }
        self.visible = visit.index;
        visit
    }

    /// Apply the gateway's answer to `request`.
    ///
    /// Answers to requests the window no longer waits for are dropped
    /// without touching the store. A partial listing is kept and its months
    /// count as loaded, but the `PartialLoad` error is still returned.
    pub fn finish_load(
        &mut self,
        request: &LoadRequest,
        result: CalGridResult<Listing>,
    ) -> CalGridResult<usize> {
        if !self.window.is_current(request.seq) {
            warn!(
                "Discarding stale response for {} through {} (load {})",
                request.first_month, request.last_month, request.seq
            );
            return Ok(0);
        }

        match result {
            Ok(listing) => {
                self.store.remove_range(&request.range);
                let outcome = self.store.ingest(&request.range, listing);
                self.window.complete(request.seq, true);
                if let Ok(added) = &outcome {
                    debug!("Loaded {} events for {}", added, request.range);
                }
                outcome
            }
            Err(e) => {
                self.window.complete(request.seq, false);
                Err(e)
            }
        }
    }

    /// Visit `index` and run every load it plans, one after another.
    /// All results are applied before the first error is returned.
    pub async fn scroll_to(&mut self, index: usize) -> CalGridResult<WindowVisit> {
        let visit = self.visit(index);

        let mut first_error = None;
        for request in &visit.loads {
            let result = self.gateway.list(Some(&request.range)).await;
            if let Err(e) = self.finish_load(request, result) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(visit),
        }
    }

    /// Drop every event and load the visible months again.
    pub async fn reload(&mut self) -> CalGridResult<WindowVisit> {
        self.store.clear();
        self.window.reset();
        self.scroll_to(self.visible).await
    }

    pub fn select(&mut self, date: Option<NaiveDate>) {
        self.selected = date;
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    /// Events of the selected day, ordered by start.
    pub fn selected_events(&mut self) -> &[Event] {
        match self.selected {
            Some(day) => {
                self.store.sort_for(day);
                self.store.events_on(day)
            }
            None => &[],
        }
    }

    pub fn month_grid(&self, index: usize) -> Option<MonthGrid> {
        let month = self.window.month_at(index)?;
        let options = GridOptions {
            week_start: self.week_start,
            today: self.today,
            selected: self.selected,
        };
        Some(MonthGrid::build(month, &options, &self.store))
    }

    /// Whether the month of `event` keeps its events in the store.
    fn holds(&self, event: &Event) -> bool {
        let day = local_date(&event.start(), &self.store.timezone());
        let residency = self.window.index_of(day).and_then(|i| self.window.residency(i));
        matches!(residency, Some(Residency::Loaded | Residency::Loading(_)))
    }

    /// Save a new event. The store only changes once the service has
    /// accepted it, and the stored copy carries the assigned id. Events in
    /// months that are not resident are left for the load that brings
    /// their month in.
    pub async fn create(&mut self, form: &EventForm) -> CalGridResult<Event> {
        let event = form.validate()?;
        let id = self.gateway.create(&event).await?;

        let event = event.with_id(id);
        if self.holds(&event) {
            self.store.add(event.clone());
        } else {
            debug!("Created event {} outside the resident months", id);
        }
        Ok(event)
    }

    pub async fn update(&mut self, form: &EventForm) -> CalGridResult<Event> {
        let event = form.validate()?;
        let original = form
            .original()
            .filter(|original| original.is_saved())
            .ok_or(ValidationError::NotSaved)?;

        self.gateway.update(&event).await?;
        if self.holds(&event) {
            self.store.replace(original, event.clone());
        } else {
            self.store.remove(original);
        }
        Ok(event)
    }

    pub async fn delete(&mut self, event: &Event) -> CalGridResult<()> {
        let id = event.id().ok_or(ValidationError::NotSaved)?;
        self.gateway.delete(id).await?;

        if !self.store.remove(event) {
            debug!("Deleted event {} was not loaded", id);
        }
        Ok(())
    }

    /// Look up a loaded event, falling back to a full listing from the service.
    pub async fn find(&self, id: EventId) -> CalGridResult<Option<Event>> {
        if let Some(event) = self.store.find(id) {
            return Ok(Some(event.clone()));
        }

        let listing = self.gateway.list(None).await?;
        Ok(listing.events.into_iter().find(|event| event.id() == Some(id)))
    }
}

impl<G> std::fmt::Debug for CalendarSession<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarSession")
            .field("visible", &self.visible)
            .field("selected", &self.selected)
            .field("today", &self.today)
            .field("events", &self.store.len())
            .field("months", &self.window.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalGridError;
    use crate::remote::memory::MemoryGateway;
    use crate::remote::protocol::WireEvent;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(title: &str, start: DateTime<Utc>) -> Event {
        Event::new(title, start, start + chrono::Duration::hours(1)).unwrap()
    }

    fn session(gateway: MemoryGateway) -> CalendarSession<MemoryGateway> {
        CalendarSession::new(
            gateway,
            Tz::UTC,
            Weekday::Sun,
            date(2024, 6, 15),
            WindowConfig::default(),
        )
        .unwrap()
    }

    fn form(title: &str, start: DateTime<Utc>) -> EventForm {
        EventForm::filled(title, start, start + chrono::Duration::minutes(30))
    }

    #[tokio::test]
    async fn first_scroll_loads_months_around_today() {
        let gateway = MemoryGateway::with_events([
            event("In range", at(2024, 5, 20, 9)),
            event("Too early", at(2023, 1, 1, 9)),
        ]);
        let mut session = session(gateway);

        let visit = session.scroll_to(session.visible_index()).await.unwrap();
        assert_eq!(visit.loads.len(), 1);
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().count_for(date(2024, 5, 20)), 1);
        assert_eq!(session.visible_month(), Some(date(2024, 6, 1)));
    }

    #[tokio::test]
    async fn scrolling_back_keeps_the_visible_month() {
        let mut session = session(MemoryGateway::new());
        session.scroll_to(3).await.unwrap();

        let month = session.window().month_at(2);
        let visit = session.scroll_to(2).await.unwrap();
        assert_eq!(visit.shifted, 3);
        assert_eq!(session.visible_month(), month);
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let gateway = MemoryGateway::with_events([event("Retry me", at(2024, 6, 3, 9))]);
        gateway.fail_next("connection refused");
        let mut session = session(gateway);

        let err = session.scroll_to(3).await.unwrap_err();
        assert!(err.is_network());
        assert!(session.store().is_empty());
        assert_eq!(session.window().residency(3), Some(Residency::Unloaded));

        session.scroll_to(3).await.unwrap();
        assert_eq!(session.store().count_for(date(2024, 6, 3)), 1);
    }

    #[tokio::test]
    async fn partial_load_keeps_valid_events() {
        let gateway = MemoryGateway::with_events([event("Good", at(2024, 6, 3, 9))]);
        gateway.seed_raw(WireEvent {
            id: -1,
            title: Some("No end".into()),
            start_date: Some("2024-06-04 09:00:00".into()),
            end_date: None,
        });
        let mut session = session(gateway);

        let err = session.scroll_to(3).await.unwrap_err();
        assert!(matches!(
            err,
            CalGridError::PartialLoad {
                added: 1,
                rejected: 1
            }
        ));
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.window().residency(3), Some(Residency::Loaded));
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let gateway = MemoryGateway::with_events([event("Once", at(2024, 6, 3, 9))]);
        let mut session = session(gateway);

        let planned = session.visit(3);
        let stale = planned.loads[0].clone();
        let listing = session.gateway().list(Some(&stale.range)).await.unwrap();

        session.reload().await.unwrap();
        assert_eq!(session.finish_load(&stale, Ok(listing)).unwrap(), 0);
        assert_eq!(session.store().count_for(date(2024, 6, 3)), 1);
    }

    #[tokio::test]
    async fn reload_does_not_duplicate() {
        let gateway = MemoryGateway::with_events([event("Once", at(2024, 6, 3, 9))]);
        let mut session = session(gateway);

        session.scroll_to(3).await.unwrap();
        session.reload().await.unwrap();
        assert_eq!(session.store().len(), 1);
    }

    #[tokio::test]
    async fn invalid_form_touches_nothing() {
        let mut session = session(MemoryGateway::new());
        let mut bad = form("Standup", at(2024, 6, 3, 9));
        bad.title = Some("  ".into());

        let err = session.create(&bad).await.unwrap_err();
        assert!(err.is_validation());
        assert!(session.gateway().is_empty());
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn create_stores_event_with_assigned_id() {
        let mut session = session(MemoryGateway::new());
        session.scroll_to(3).await.unwrap();

        let created = session.create(&form("Standup", at(2024, 6, 3, 9))).await.unwrap();
        assert_eq!(created.id(), Some(1));
        assert_eq!(session.gateway().len(), 1);
        assert_eq!(
            session.store().event_at(date(2024, 6, 3), 0).unwrap(),
            &created
        );
    }

    #[tokio::test]
    async fn gateway_failure_leaves_store_untouched() {
        let mut session = session(MemoryGateway::new());
        session.gateway().fail_next("timeout");

        let err = session.create(&form("Standup", at(2024, 6, 3, 9))).await.unwrap_err();
        assert!(err.is_network());
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn update_moves_event_to_its_new_day() {
        let mut session = session(MemoryGateway::new());
        session.scroll_to(3).await.unwrap();
        let created = session.create(&form("Standup", at(2024, 6, 3, 9))).await.unwrap();

        let mut edit = EventForm::edit(&created);
        edit.start = Some(at(2024, 6, 4, 9));
        edit.end = Some(at(2024, 6, 4, 10));
        let updated = session.update(&edit).await.unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(session.store().count_for(date(2024, 6, 3)), 0);
        assert_eq!(session.store().count_for(date(2024, 6, 4)), 1);
        let stored = session.gateway().get(1).unwrap();
        assert_eq!(stored.start_date.as_deref(), Some("2024-06-04 09:00:00"));
    }

    #[tokio::test]
    async fn created_event_outside_resident_months_stays_out_of_store() {
        let config = WindowConfig {
            batch_size: 2,
            edge_margin: 1,
            resident_months: 5,
        };
        let mut session = CalendarSession::new(
            MemoryGateway::new(),
            Tz::UTC,
            Weekday::Sun,
            date(2024, 6, 15),
            config,
        )
        .unwrap();
        session.scroll_to(session.visible_index()).await.unwrap();

        let far = session.create(&form("Far off", at(2026, 6, 3, 9))).await.unwrap();
        assert_eq!(session.gateway().len(), 1);
        assert!(session.store().is_empty());

        for _ in 0..12 {
            session.scroll_to(0).await.unwrap();
        }
        assert!(session.window().resident_count() <= 5 + 2);
        assert!(session.store().is_empty());
        assert_eq!(session.find(far.id().unwrap()).await.unwrap(), Some(far));
    }

    #[tokio::test]
    async fn update_into_unloaded_month_drops_stored_copy() {
        let mut session = session(MemoryGateway::new());
        session.scroll_to(3).await.unwrap();
        let created = session.create(&form("Standup", at(2024, 6, 3, 9))).await.unwrap();

        let mut edit = EventForm::edit(&created);
        edit.start = Some(at(2027, 1, 4, 9));
        edit.end = Some(at(2027, 1, 4, 10));
        session.update(&edit).await.unwrap();

        assert!(session.store().is_empty());
        let stored = session.gateway().get(1).unwrap();
        assert_eq!(stored.start_date.as_deref(), Some("2027-01-04 09:00:00"));
    }

    #[tokio::test]
    async fn update_and_delete_need_a_saved_event() {
        let mut session = session(MemoryGateway::new());
        let unsaved = event("Draft", at(2024, 6, 3, 9));

        let err = session.update(&form("Draft", at(2024, 6, 3, 9))).await.unwrap_err();
        assert!(matches!(err, CalGridError::Validation(ValidationError::NotSaved)));

        let err = session.delete(&unsaved).await.unwrap_err();
        assert!(matches!(err, CalGridError::Validation(ValidationError::NotSaved)));
    }

    #[tokio::test]
    async fn delete_removes_from_service_and_store() {
        let mut session = session(MemoryGateway::new());
        session.scroll_to(3).await.unwrap();
        let a = session.create(&form("A", at(2024, 6, 3, 9))).await.unwrap();
        let b = session.create(&form("B", at(2024, 6, 3, 11))).await.unwrap();

        session.delete(&a).await.unwrap();
        assert_eq!(session.gateway().len(), 1);
        assert_eq!(session.store().count_for(date(2024, 6, 3)), 1);
        assert_eq!(session.store().event_at(date(2024, 6, 3), 0).unwrap(), &b);
    }

    #[tokio::test]
    async fn selected_events_are_sorted() {
        let mut session = session(MemoryGateway::new());
        session.scroll_to(3).await.unwrap();
        session.create(&form("Late", at(2024, 6, 3, 15))).await.unwrap();
        session.create(&form("Early", at(2024, 6, 3, 8))).await.unwrap();

        assert!(session.selected_events().is_empty());
        session.select(Some(date(2024, 6, 3)));
        let titles: Vec<_> = session.selected_events().iter().map(Event::title).collect();
        assert_eq!(titles, ["Early", "Late"]);
    }

    #[tokio::test]
    async fn month_grid_marks_loaded_days() {
        let gateway = MemoryGateway::with_events([event("Dentist", at(2024, 6, 12, 9))]);
        let mut session = session(gateway);
        session.scroll_to(3).await.unwrap();
        session.select(Some(date(2024, 6, 20)));

        let grid = session.month_grid(session.visible_index()).unwrap();
        let (row, col) = grid.position_of(date(2024, 6, 12)).unwrap();
        assert!(grid.cell(row, col).unwrap().has_event);
        let (row, col) = grid.position_of(date(2024, 6, 15)).unwrap();
        assert!(grid.cell(row, col).unwrap().is_today);
        let (row, col) = grid.position_of(date(2024, 6, 20)).unwrap();
        assert!(grid.cell(row, col).unwrap().is_selected);

        assert!(session.month_grid(99).is_none());
    }

    #[tokio::test]
    async fn anchored_session_opens_on_another_month() {
        let session = CalendarSession::anchored(
            MemoryGateway::new(),
            Tz::UTC,
            Weekday::Mon,
            date(2024, 6, 15),
            date(2031, 2, 10),
            WindowConfig::default(),
        )
        .unwrap();

        assert_eq!(session.visible_month(), Some(date(2031, 2, 1)));
        assert_eq!(session.today(), date(2024, 6, 15));
    }

    #[tokio::test]
    async fn find_falls_back_to_the_service() {
        let gateway = MemoryGateway::with_events([event("Far away", at(2030, 1, 1, 9))]);
        let session = session(gateway);

        let found = session.find(1).await.unwrap().unwrap();
        assert_eq!(found.title(), "Far away");
        assert!(session.find(2).await.unwrap().is_none());
    }
}
