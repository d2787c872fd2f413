//! Wire format of the events service.
//!
//! Records carry `start_date`/`end_date` as `YYYY-MM-DD HH:MM:SS` in UTC and
//! use id -1 for "not stored". Mutations answer with an [`ApiResponse`]
//! envelope whose `code` is 200 on success.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{UNSAVED_ID, WIRE_DATETIME_FORMAT};
use crate::date_range::DateRange;
use crate::error::{CalGridError, CalGridResult};
use crate::event::{Event, EventId};

pub const SUCCESS_CODE: i64 = 200;

fn unsaved_id() -> i64 {
    UNSAVED_ID
}

/// An event record exactly as the service sends and accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(default = "unsaved_id")]
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

pub fn format_wire_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(WIRE_DATETIME_FORMAT).to_string()
}

pub fn parse_wire_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, WIRE_DATETIME_FORMAT).map(|dt| dt.and_utc())
}

fn required_datetime(field: &str, value: Option<&str>, id: i64) -> CalGridResult<DateTime<Utc>> {
    let raw = value.ok_or_else(|| {
        CalGridError::InvalidRecord(format!("event {} has no {}", id, field))
    })?;
    parse_wire_datetime(raw).map_err(|e| {
        CalGridError::InvalidRecord(format!("event {} has bad {} '{}': {}", id, field, raw, e))
    })
}

impl TryFrom<WireEvent> for Event {
    type Error = CalGridError;

    fn try_from(wire: WireEvent) -> CalGridResult<Self> {
        let start = required_datetime("start_date", wire.start_date.as_deref(), wire.id)?;
        let end = required_datetime("end_date", wire.end_date.as_deref(), wire.id)?;

        let event = Event::new(wire.title.unwrap_or_default(), start, end).map_err(|e| {
            CalGridError::InvalidRecord(format!("event {}: {}", wire.id, e))
        })?;

        Ok(if wire.id == UNSAVED_ID {
            event
        } else {
            event.with_id(wire.id)
        })
    }
}

impl From<&Event> for WireEvent {
    fn from(event: &Event) -> Self {
        WireEvent {
            id: event.id().unwrap_or(UNSAVED_ID),
            title: Some(event.title().to_string()),
            start_date: Some(format_wire_datetime(&event.start())),
            end_date: Some(format_wire_datetime(&event.end())),
        }
    }
}

impl From<Event> for WireEvent {
    fn from(event: Event) -> Self {
        WireEvent::from(&event)
    }
}

/// Envelope returned by create, update and delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, data: impl Into<String>) -> Self {
        ApiResponse {
            code: SUCCESS_CODE,
            message: message.into(),
            data: data.into(),
        }
    }

    pub fn error(code: i64, message: impl Into<String>) -> Self {
        ApiResponse {
            code,
            message: message.into(),
            data: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// The `data` payload on success, otherwise a `Rejected` error.
    pub fn into_result(self) -> CalGridResult<String> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(CalGridError::Rejected {
                code: self.code,
                message: self.message,
            })
        }
    }

    /// Id of a freshly created event, carried as a decimal string.
    pub fn created_id(self) -> CalGridResult<EventId> {
        let data = self.into_result()?;
        data.trim().parse().map_err(|_| {
            CalGridError::Serialization(format!("Server returned invalid event id '{}'", data))
        })
    }
}

/// Query string of `GET /events`. Both bounds or neither.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<&DateRange> for RangeQuery {
    fn from(range: &DateRange) -> Self {
        RangeQuery {
            start_date: Some(format_wire_datetime(&range.from)),
            end_date: Some(format_wire_datetime(&range.to)),
        }
    }
}

/// Query string of `DELETE /events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdQuery {
    pub id: EventId,
}
