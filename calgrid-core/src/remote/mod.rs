//! Access to the remote events service.
//!
//! `EventGateway` is the seam: [`http::HttpGateway`] talks to the real
//! service, [`memory::MemoryGateway`] keeps everything in process.

pub mod http;
pub mod memory;
pub mod protocol;

use std::future::Future;

use tracing::warn;

use crate::date_range::DateRange;
use crate::error::CalGridResult;
use crate::event::{Event, EventId};
use crate::remote::protocol::WireEvent;

/// CRUD over the `events` resource.
pub trait EventGateway {
    /// Events starting within `range`, or every event when `range` is None.
    fn list(&self, range: Option<&DateRange>) -> impl Future<Output = CalGridResult<Listing>> + Send;

    /// Store a new event and return the id the service assigned.
    fn create(&self, event: &Event) -> impl Future<Output = CalGridResult<EventId>> + Send;

    /// Overwrite the stored event with the same id.
    fn update(&self, event: &Event) -> impl Future<Output = CalGridResult<()>> + Send;

    fn delete(&self, id: EventId) -> impl Future<Output = CalGridResult<()>> + Send;
}

/// Result of a list call: the records that converted, and why the rest did not.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub events: Vec<Event>,
    pub rejected: Vec<String>,
}

impl Listing {
    pub fn from_records(records: impl IntoIterator<Item = WireEvent>) -> Self {
        let mut listing = Listing::default();
        for record in records {
            listing.push_record(record);
        }
        listing
    }

    pub fn push_record(&mut self, record: WireEvent) {
        match Event::try_from(record) {
            Ok(event) => self.events.push(event),
            Err(e) => self.reject(e.to_string()),
        }
    }

    pub fn reject(&mut self, reason: String) {
        warn!("Rejecting event record: {}", reason);
        self.rejected.push(reason);
    }

    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}
