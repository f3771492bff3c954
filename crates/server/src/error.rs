//! Mapping of library errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rp_core::credentials::CredentialError;
use rp_core::engine::error::EngineError;
use rp_core::media::MediaError;
use rp_core::supervisor::ControlError;
use rp_protocol::ErrorBody;
use thiserror::Error;

/// Errors returned by request handlers.
///
/// Every variant renders as `{ "error": "..." }` with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Type alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(EngineError::Conflict) => StatusCode::CONFLICT,
            ApiError::Engine(EngineError::UnknownStep(_)) => StatusCode::NOT_FOUND,
            ApiError::Engine(EngineError::StepNotRunnable { .. }) => StatusCode::CONFLICT,
            ApiError::Control(ControlError::Unsupported(_)) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Control(ControlError::ProcessGone(_)) => StatusCode::CONFLICT,
            ApiError::Control(ControlError::Signal { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Credentials(CredentialError::NothingToUpdate) => StatusCode::BAD_REQUEST,
            ApiError::Credentials(CredentialError::Write { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Media(MediaError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Media(MediaError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
