//! Core types for calgrid.
//!
//! - `store` indexes events by calendar day
//! - `month_grid` lays a month out as complete weeks
//! - `window` tracks the scrollable run of months and what to load next
//! - `session` ties them to a `remote::EventGateway`

pub mod config;
pub mod constants;
pub mod date_range;
pub mod dates;
pub mod day_key;
pub mod error;
pub mod event;
pub mod form;
pub mod month_grid;
pub mod remote;
pub mod session;
pub mod store;
pub mod window;

pub use day_key::DayKey;
pub use error::{CalGridError, CalGridResult, ValidationError};
pub use event::{Event, EventId};
