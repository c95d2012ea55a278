//! API error type mapping to HTTP status codes

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use draftloop_error::Error;
use serde_json::json;

/// Errors returned by the JSON API. Run failures are not errors; they come
/// back as a failure presentation with status 200.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request body: malformed JSON, empty input, unknown bot
    Validation(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Validation(e.message().to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        };

        let body = json!({ "error": { "code": code, "message": message } });
        (status, Json(body)).into_response()
    }
}
