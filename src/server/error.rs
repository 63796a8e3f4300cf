//! HTTP mapping of [`ConvertError`].
//!
//! Errors are returned as `{"error": "<message>"}`. Client errors expose
//! their message; internal ones (engine, I/O, configuration) are logged with
//! full detail and answered with a generic message so file paths and library
//! internals never leak to callers.

use crate::error::ConvertError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

impl ConvertError {
    /// Status code this error is answered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConvertError::UnsupportedConversion { .. }
            | ConvertError::InvalidFormat { .. }
            | ConvertError::EmptyInput { .. }
            | ConvertError::InvalidBase64(_)
            | ConvertError::InvalidRequest(_)
            | ConvertError::InvalidFileName(_) => StatusCode::BAD_REQUEST,
            ConvertError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ConvertError::NotFound(_) => StatusCode::NOT_FOUND,
            ConvertError::ConversionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ConvertError::DownloadFailed { .. } => StatusCode::BAD_GATEWAY,
            ConvertError::DownloadTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ConvertError::PdfiumBindingFailed(_)
            | ConvertError::OutputWriteFailed { .. }
            | ConvertError::InvalidConfig(_)
            | ConvertError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "internal server error");
            "internal server error".to_owned()
        } else {
            warn!(status = status.as_u16(), error = %self, "request failed");
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
