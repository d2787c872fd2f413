pub mod events;

use axum::Json;
use axum::response::{IntoResponse, Response};
use calgrid_core::CalGridError;
use calgrid_core::remote::protocol::ApiResponse;

/// Code reported for requests the service cannot make sense of.
pub const BAD_REQUEST: i64 = 400;

const INTERNAL_ERROR: i64 = 500;

/// Envelope for a failed operation. The HTTP status stays 200.
pub struct ApiError(ApiResponse);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError(ApiResponse::error(BAD_REQUEST, message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

impl From<CalGridError> for ApiError {
    fn from(err: CalGridError) -> Self {
        match err {
            CalGridError::Rejected { code, message } => ApiError(ApiResponse::error(code, message)),
            CalGridError::Validation(_) | CalGridError::InvalidRecord(_) => {
                ApiError::bad_request(err.to_string())
            }
            other => ApiError(ApiResponse::error(INTERNAL_ERROR, other.to_string())),
        }
    }
}
