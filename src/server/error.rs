//! HTTP error mapping for both services.

use crate::error::{AuthError, PdfTableError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Everything a handler or middleware can reject a request with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Pipeline(#[from] PdfTableError),

    /// The request body could not be read as the endpoint expects.
    #[error("{0}")]
    InvalidRequest(String),

    /// The JSON body does not match the request schema.
    #[error("{0}")]
    Unprocessable(String),
}

impl ApiError {
    /// Status code and `detail` text sent to the client.
    pub fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            ApiError::Auth(AuthError::SecretNotConfigured) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Pipeline(e) if e.is_fetch_error() => (
                StatusCode::BAD_REQUEST,
                format!("Failed to fetch PDF from URL: {}", e),
            ),
            ApiError::Pipeline(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An error occurred: {}", e),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        if status.is_server_error() {
            tracing::error!("{}", detail);
        } else {
            tracing::warn!("Rejected request ({}): {}", status.as_u16(), detail);
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
