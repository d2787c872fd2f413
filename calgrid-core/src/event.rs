//! Calendar events as the rest of calgrid sees them.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::remote::protocol::WireEvent;

/// Server-assigned event identifier.
pub type EventId = i64;

/// A calendar event.
///
/// `start < end` always holds: the only ways to build one are [`Event::new`]
/// and conversion from a [`WireEvent`], and both check it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEvent", into = "WireEvent")]
pub struct Event {
    id: Option<EventId>,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Event {
    /// Create an unsaved event.
    pub fn new(
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EndNotAfterStart);
        }
        Ok(Event {
            id: None,
            title: title.into(),
            start,
            end,
        })
    }

    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }

    /// None until the service has stored the event.
    pub fn id(&self) -> Option<EventId> {
        self.id
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({} - {})",
            self.title,
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}
