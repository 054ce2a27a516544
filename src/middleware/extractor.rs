use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Key;

use super::bridge::BridgeRejection;
use super::cookies;
use super::error::AuthError;
use super::state::AppState;
use super::traits::{AccountStore, SessionStore, TaskStore};
use crate::types::{Identity, SessionId};

/// Shown on the login page when the session could not be checked.
const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable, please try again";

/// Signed-in browser user, admitted through the session bridge.
///
/// Use as an Axum extractor in page handlers. Redirects to the login page (or answers
/// htmx with `HX-Redirect`) if the session is missing or its credential no longer resolves.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(user: SessionUser) -> impl IntoResponse {
///     format!("Hello, {}", user.display_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// Session ID (from cookie).
    pub session_id: SessionId,
    /// Live identity resolved from the session's credential.
    pub identity: Identity,
    /// Name captured at login, for page headers.
    pub display_name: String,
}

/// API caller authenticated by `Authorization: Bearer`.
///
/// Rejects with a `401` JSON body.
#[derive(Debug, Clone)]
pub struct ApiUser(pub Identity);

impl<A, T, S> FromRequestParts<AppState<A, T, S>> for SessionUser
where
    A: AccountStore,
    T: TaskStore,
    S: SessionStore,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<A, T, S>,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar<Key> = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::Unauthenticated)?;

        let cookie_name = &state.settings.session_cookie_name;
        let session_id = cookies::session_id(&jar, cookie_name);
        let had_cookie = session_id.is_some();

        match state.bridge().admit(session_id).await {
            Ok(user) => Ok(user),
            Err(BridgeRejection::Store(e)) => {
                tracing::error!(error = %e, path = %parts.uri.path(), "Session check failed");
                let login_path = &state.settings.login_path;
                Err(AuthError::LoginRequired {
                    login_path: format!(
                        "{login_path}?error={}",
                        urlencoding::encode(SERVICE_UNAVAILABLE)
                    ),
                    htmx: is_htmx(&parts.headers),
                    expired_cookie: None,
                })
            }
            Err(rejection) => {
                tracing::debug!(reason = %rejection, path = %parts.uri.path(), "Login required");
                let expired_cookie = (had_cookie
                    && !matches!(rejection, BridgeRejection::NoCredential))
                .then(|| cookies::clear_session_cookie(cookie_name).to_string());
                Err(AuthError::LoginRequired {
                    login_path: state.settings.login_path.clone(),
                    htmx: is_htmx(&parts.headers),
                    expired_cookie,
                })
            }
        }
    }
}

impl<A, T, S> FromRequestParts<AppState<A, T, S>> for ApiUser
where
    A: AccountStore,
    T: TaskStore,
    S: SessionStore,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<A, T, S>,
    ) -> Result<Self, Self::Rejection> {
        state.gate().authenticate(&parts.headers).await.map(Self)
    }
}

/// Whether the request was issued by htmx (`HX-Request: true`).
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
