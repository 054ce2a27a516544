use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::ServiceError;
use crate::web::ApiError;

/// Authentication errors for the middleware layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// API request without a usable bearer credential.
    #[error("Not authenticated")]
    Unauthenticated,

    /// UI request that must go through the login page first.
    #[error("Login required")]
    LoginRequired {
        login_path: String,
        /// Request came from htmx, which cannot follow a plain redirect into a full page.
        htmx: bool,
        /// `Set-Cookie` value that drops a dead session cookie.
        expired_cookie: Option<String>,
    },

    /// Account store operation failed while authenticating an API request.
    #[error("Session store error: {0}")]
    Store(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => ApiError::Unauthenticated.into_response(),
            Self::LoginRequired {
                login_path,
                htmx,
                expired_cookie,
            } => {
                let mut response = redirect(&login_path, htmx);
                if let Some(value) = expired_cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                response
            }
            Self::Store(_) | Self::Config(_) => {
                ApiError::Service(ServiceError::Store(self.to_string())).into_response()
            }
        }
    }
}

/// Redirect that htmx can follow: a `200` carrying `HX-Redirect` for htmx requests,
/// a plain `303 See Other` otherwise.
pub(crate) fn redirect(to: &str, htmx: bool) -> Response {
    if htmx {
        (StatusCode::OK, [("hx-redirect", to)]).into_response()
    } else {
        Redirect::to(to).into_response()
    }
}
