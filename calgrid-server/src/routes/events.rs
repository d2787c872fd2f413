//! `/events` endpoints

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Form, Json, Router};
use calgrid_core::constants::UNSAVED_ID;
use calgrid_core::date_range::DateRange;
use calgrid_core::event::{Event, EventId};
use calgrid_core::remote::EventGateway;
use calgrid_core::remote::protocol::{ApiResponse, RangeQuery, WireEvent, parse_wire_datetime};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::AppState;
use crate::routes::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/events",
        get(list_events)
            .post(create_event)
            .put(update_event)
            .delete(delete_event),
    )
}

fn parse_bound(name: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_wire_datetime(value)
        .map_err(|e| ApiError::bad_request(format!("Invalid {name} '{value}': {e}")))
}

/// GET /events - every record, or those starting within both bounds
async fn list_events(
    State(gateway): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<WireEvent>>, ApiError> {
    let range = match (query.start_date.as_deref(), query.end_date.as_deref()) {
        (None, None) => None,
        (Some(start), Some(end)) => Some(DateRange::new(
            parse_bound("start_date", start)?,
            parse_bound("end_date", end)?,
        )),
        _ => return Err(ApiError::bad_request("Invalid URL request.")),
    };

    Ok(Json(gateway.records_in(range.as_ref())))
}

/// POST /events - store a new event, answering with its id
async fn create_event(
    State(gateway): State<AppState>,
    Form(record): Form<WireEvent>,
) -> Result<Json<ApiResponse>, ApiError> {
    let event = Event::try_from(WireEvent {
        id: UNSAVED_ID,
        ..record
    })?;
    let id = gateway.create(&event).await?;

    info!("Created event {}: {}", id, event);
    Ok(Json(ApiResponse::ok("Successfully created event.", id.to_string())))
}

/// PUT /events - overwrite the event with the form's id
async fn update_event(
    State(gateway): State<AppState>,
    Form(record): Form<WireEvent>,
) -> Result<Json<ApiResponse>, ApiError> {
    if record.id == UNSAVED_ID {
        return Err(ApiError::bad_request("Missing event id."));
    }

    let event = Event::try_from(record)?;
    gateway.update(&event).await?;

    info!("Updated event {}", event);
    Ok(Json(ApiResponse::ok("Successfully updated event.", "")))
}

#[derive(Deserialize)]
struct DeleteParams {
    id: Option<EventId>,
}

/// DELETE /events?id= - unknown ids succeed
async fn delete_event(
    State(gateway): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id = params
        .id
        .ok_or_else(|| ApiError::bad_request("Missing event id."))?;
    gateway.delete(id).await?;

    info!("Deleted event {}", id);
    Ok(Json(ApiResponse::ok("Successfully deleted event.", "")))
}
