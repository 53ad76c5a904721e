use std::fmt::Display;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::{Error, Result as ServiceResult};

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Extension trait for converting service results to API errors.
///
/// Input problems keep their own message. Storage failures are logged with
/// `message` as context and reported to the client as `message` only.
pub trait ServiceResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;

    /// Like `api_err`, with the item the request targeted in the log line.
    fn api_err_for(self, message: &'static str, subject: impl Display) -> Result<T, ApiError>;
}

impl<T> ServiceResultExt<T> for ServiceResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| to_api_error(e, message, None))
    }

    fn api_err_for(self, message: &'static str, subject: impl Display) -> Result<T, ApiError> {
        self.map_err(|e| to_api_error(e, message, Some(&subject)))
    }
}

fn to_api_error(e: Error, message: &'static str, subject: Option<&dyn Display>) -> ApiError {
    match e {
        Error::InvalidArgument(msg) | Error::Conflict(msg) => ApiError::bad_request(msg),
        Error::NotFound => ApiError::not_found("item not found"),
        e => {
            match subject {
                Some(subject) => tracing::error!("{message} ({subject}): {e}"),
                None => tracing::error!("{message}: {e}"),
            }
            ApiError::internal(message)
        }
    }
}
