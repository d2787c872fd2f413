//! In-process events service.
//!
//! Behaves like the HTTP service: ids are assigned from 1, range filters are
//! inclusive at both ends, deleting an unknown id succeeds. A failure can be
//! queued for the next call.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::date_range::DateRange;
use crate::error::{CalGridError, CalGridResult, ValidationError};
use crate::event::{Event, EventId};
use crate::remote::protocol::{WireEvent, parse_wire_datetime};
use crate::remote::{EventGateway, Listing};

#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: EventId,
    records: BTreeMap<EventId, WireEvent>,
    fail_next: Option<String>,
}

impl MemoryState {
    fn take_failure(&mut self) -> CalGridResult<()> {
        match self.fail_next.take() {
            Some(message) => Err(CalGridError::Network(message)),
            None => Ok(()),
        }
    }

    fn insert(&mut self, mut record: WireEvent) -> EventId {
        self.last_id += 1;
        record.id = self.last_id;
        self.records.insert(record.id, record);
        self.last_id
    }
}

fn in_range(record: &WireEvent, range: &DateRange) -> bool {
    record
        .start_date
        .as_deref()
        .and_then(|s| parse_wire_datetime(s).ok())
        .is_some_and(|start| range.from <= start && start <= range.to)
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store each event under a fresh id.
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let gateway = Self::new();
        {
            let mut state = gateway.lock();
            for event in events {
                state.insert(WireEvent::from(&event));
            }
        }
        gateway
    }

    /// Store a record as-is, malformed or not, under a fresh id.
    pub fn seed_raw(&self, record: WireEvent) -> EventId {
        self.lock().insert(record)
    }

    /// Make the next call fail with a network error.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    /// Stored records starting within `range`, malformed ones included.
    /// A record without a readable start only matches a full listing.
    pub fn records_in(&self, range: Option<&DateRange>) -> Vec<WireEvent> {
        self.lock()
            .records
            .values()
            .filter(|record| range.is_none_or(|range| in_range(record, range)))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: EventId) -> Option<WireEvent> {
        self.lock().records.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventGateway for MemoryGateway {
    async fn list(&self, range: Option<&DateRange>) -> CalGridResult<Listing> {
        self.lock().take_failure()?;
        Ok(Listing::from_records(self.records_in(range)))
    }

    async fn create(&self, event: &Event) -> CalGridResult<EventId> {
        let mut state = self.lock();
        state.take_failure()?;
        Ok(state.insert(WireEvent::from(event)))
    }

    async fn update(&self, event: &Event) -> CalGridResult<()> {
        let mut state = self.lock();
        state.take_failure()?;

        let id = event.id().ok_or(ValidationError::NotSaved)?;
        match state.records.get_mut(&id) {
            Some(record) => {
                *record = WireEvent::from(event);
                Ok(())
            }
            None => Err(CalGridError::Rejected {
                code: 404,
                message: format!("No event with id {}", id),
            }),
        }
    }

    async fn delete(&self, id: EventId) -> CalGridResult<()> {
        let mut state = self.lock();
        state.take_failure()?;
        state.records.remove(&id);
        Ok(())
    }
}
