use axum::Json;
use axum::extract::Request;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::ServiceError;

/// Failures of the JSON API, rendered as an [`ErrorBody`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Uniform JSON error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub status: u16,
    pub message: String,
    pub path: String,
}

impl ErrorBody {
    fn new(status: StatusCode, message: String, path: String) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            status: status.as_u16(),
            message,
            path,
        }
    }
}

/// Left on an error response so [`stamp_error_path`] can re-render it with the request path.
#[derive(Debug, Clone)]
struct PendingError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Service(ServiceError::NotFound(message)) => (StatusCode::NOT_FOUND, message),
            Self::Service(ServiceError::Validation(message)) => (StatusCode::BAD_REQUEST, message),
            Self::Service(ServiceError::DuplicateAccount(message)) => (StatusCode::CONFLICT, message),
            Self::Service(e @ ServiceError::BadCredentials) => (StatusCode::UNAUTHORIZED, e.to_string()),
            Self::Service(e) => {
                tracing::error!(error = %e, "Unexpected error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let mut response =
            (status, Json(ErrorBody::new(status, message.clone(), String::new()))).into_response();
        response
            .extensions_mut()
            .insert(PendingError { status, message });
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Fills in [`ErrorBody::path`] for errors raised by handlers and extractors.
pub(crate) async fn stamp_error_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<PendingError>() {
        Some(PendingError { status, message }) => {
            (status, Json(ErrorBody::new(status, message, path))).into_response()
        }
        None => response,
    }
}
