//! Development events service.
//!
//! Serves `/events` in the calgrid wire format from an in-memory store:
//! GET lists records (optionally by `start_date`/`end_date`, inclusive),
//! POST and PUT take form bodies, DELETE takes `id` from the query.
//! Mutations always answer HTTP 200 with a `{code, message, data}` envelope.

mod routes;

use std::sync::Arc;

use axum::Router;
use calgrid_core::remote::memory::MemoryGateway;
use tower_http::cors::{Any, CorsLayer};

pub type AppState = Arc<MemoryGateway>;

pub fn router(gateway: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::events::router())
        .with_state(gateway)
        .layer(cors)
}
