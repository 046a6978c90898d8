//! Error translation at the API boundary
//!
//! One mapping for every endpoint: crate errors become HTTP statuses with
//! the uniform error envelope. Argument validation surfaces as 400 before
//! any query executes; an uninitialized façade surfaces as 503; everything
//! else is a 500 with the underlying message in the envelope.

use crate::error::Error;
use crate::models::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// Wrapper carrying crate errors across handler boundaries
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "Invalid request parameter"),
            Error::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "Service not ready"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.0);
        }

        let body = Json(ApiResponse::error(message, self.0.to_string()));
        (status, body).into_response()
    }
}
