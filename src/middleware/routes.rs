use axum::Form;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, header::USER_AGENT};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use time::OffsetDateTime;

use super::cookies;
use super::state::AppState;
use super::traits::{AccountStore, SessionStore, TaskStore};
use super::types::NewSession;
use crate::error::ServiceError;
use crate::service::{self, LoginOutcome, LoginRequest, RegisterRequest};

/// Browser login, registration and logout. Each successful login opens a session that
/// carries the freshly issued credential.
pub fn session_routes<A, T, S>() -> Router<AppState<A, T, S>>
where
    A: AccountStore,
    T: TaskStore,
    S: SessionStore,
{
    Router::new()
        .route("/ui/login", post(login::<A, T, S>))
        .route("/ui/register", post(register::<A, T, S>))
        .route(
            "/ui/logout",
            get(logout::<A, T, S>).post(logout::<A, T, S>),
        )
}

// ── Login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let request = LoginRequest {
        username: form.username,
        password: form.password,
    };
    let username = request.username.clone();

    let outcome = service::login(&*state.accounts, &*state.hasher, state.authority(), request)
        .await
        .map_err(|e| {
            tracing::warn!(username = %username, error = %e, "UI login failed");
            login_error(&state.settings.login_path, "Invalid credentials")
        })?;

    start_session(&state, jar, &headers, outcome).await
}

// ── Register ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn register<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let register_path = &state.settings.register_path;
    let credentials = LoginRequest {
        username: form.username.clone(),
        password: form.password.clone(),
    };

    service::register(
        &*state.accounts,
        &*state.hasher,
        RegisterRequest {
            username: form.username,
            email: form.email,
            password: form.password,
        },
    )
    .await
    .map_err(|e| {
        tracing::warn!(username = %credentials.username, error = %e, "UI registration failed");
        let message = match e {
            ServiceError::Validation(m) | ServiceError::DuplicateAccount(m) => m,
            _ => "Registration failed".into(),
        };
        login_error(register_path, &message)
    })?;

    let outcome = service::login(&*state.accounts, &*state.hasher, state.authority(), credentials)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Login after registration failed");
            login_error(&state.settings.login_path, "Invalid credentials")
        })?;

    start_session(&state, jar, &headers, outcome).await
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let cookie_name = &state.settings.session_cookie_name;
    let session_id = cookies::session_id(&jar, cookie_name);
    state.bridge().logout(session_id.as_ref()).await;

    let clear_cookie = cookies::clear_session_cookie(cookie_name);
    (jar.remove(clear_cookie), Redirect::to(&state.settings.login_path))
}

// ── Helpers ────────────────────────────────────────────────────────

/// Stores the credential in a new session and points the cookie at it. Any session the
/// browser already had is destroyed first.
async fn start_session<A: AccountStore, T: TaskStore, S: SessionStore>(
    state: &AppState<A, T, S>,
    jar: PrivateCookieJar,
    headers: &HeaderMap,
    outcome: LoginOutcome,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let cookie_name = &state.settings.session_cookie_name;
    if let Some(previous) = cookies::session_id(&jar, cookie_name) {
        state.bridge().logout(Some(&previous)).await;
    }

    let username = outcome.identity.username;
    let session = NewSession {
        credential: outcome.credential,
        username: username.clone(),
        user_agent: extract_user_agent(headers),
        ip_address: extract_client_ip(headers),
        expires_at: OffsetDateTime::now_utc() + state.authority().ttl(),
    };

    let session_id = state.sessions.create(session).await.map_err(|e| {
        tracing::error!(error = %e, "Session creation failed");
        login_error(&state.settings.login_path, "session_failed")
    })?;

    let session_cookie = cookies::session_cookie(
        cookie_name,
        &session_id,
        state.authority().ttl(),
        state.settings.secure_cookies,
    );

    tracing::info!(session_id = %session_id, username = %username, "UI login successful");

    Ok((
        jar.add(session_cookie),
        Redirect::to(&state.settings.landing_path),
    ))
}

fn login_error(error_redirect: &str, message: &str) -> Response {
    let encoded = urlencoding::encode(message);
    Redirect::to(&format!("{error_redirect}?error={encoded}")).into_response()
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}
