use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::SurgeonError;

/// Any stage failure, rendered as `400 {"error": message}`.
#[derive(Debug)]
pub struct ApiError(pub SurgeonError);

impl From<SurgeonError> for ApiError {
    fn from(err: SurgeonError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::warn!("Request failed: {}", self.0);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}
