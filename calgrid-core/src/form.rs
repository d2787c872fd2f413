//! Editable copy of an event, checked before anything is sent.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Fields being filled in for a new event, or changed on an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventForm {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    original: Option<Event>,
}

impl EventForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A create-mode form with every field set.
    pub fn filled(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        EventForm {
            title: Some(title.into()),
            start: Some(start),
            end: Some(end),
            original: None,
        }
    }

    /// Form prefilled from `event`; validating it keeps the event's id.
    pub fn edit(event: &Event) -> Self {
        EventForm {
            title: Some(event.title().to_string()),
            start: Some(event.start()),
            end: Some(event.end()),
            original: Some(event.clone()),
        }
    }

    pub fn mode(&self) -> FormMode {
        if self.original.is_some() {
            FormMode::Edit
        } else {
            FormMode::Create
        }
    }

    /// The event as it was before editing.
    pub fn original(&self) -> Option<&Event> {
        self.original.as_ref()
    }

    pub fn validate(&self) -> Result<Event, ValidationError> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .ok_or(ValidationError::MissingTitle)?;
        let start = self.start.ok_or(ValidationError::MissingStart)?;
        let end = self.end.ok_or(ValidationError::MissingEnd)?;

        let event = Event::new(title, start, end)?;
        Ok(match self.original.as_ref().and_then(Event::id) {
            Some(id) => event.with_id(id),
            None => event,
        })
    }
}
