use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::{Json, Router};
use time::OffsetDateTime;

use super::error::{ApiError, stamp_error_path};
use crate::middleware::{AccountStore, ApiUser, AppState, SessionStore, TaskStore};
use crate::scoring::ScoreSnapshot;
use crate::service::{self, LoginRequest, RegisterRequest, TokenResponse};
use crate::task::{Task, TaskDraft, TaskPatch};
use crate::types::{AccountSummary, TaskId};

/// `Json` whose rejection is a 400 [`ApiError`] body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct ApiJson<T>(pub T);

/// `Path` whose rejection is a 400 [`ApiError`] body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub(crate) struct ApiPath<T>(pub T);

/// JSON API routes. Everything except `/api/auth/*` requires a bearer credential.
pub fn api_routes<A, T, S>() -> Router<AppState<A, T, S>>
where
    A: AccountStore,
    T: TaskStore,
    S: SessionStore,
{
    Router::new()
        .route("/api/auth/register", post(register::<A, T, S>))
        .route("/api/auth/login", post(login::<A, T, S>))
        .route(
            "/api/tasks",
            get(list_tasks::<A, T, S>).post(create_task::<A, T, S>),
        )
        .route(
            "/api/tasks/{id}",
            get(get_task::<A, T, S>)
                .put(update_task::<A, T, S>)
                .delete(delete_task::<A, T, S>),
        )
        .route("/api/stats", get(stats::<A, T, S>))
        .layer(from_fn(stamp_error_path))
}

// ── Auth ───────────────────────────────────────────────────────────

async fn register<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<AccountSummary>, ApiError> {
    let summary = service::register(&*state.accounts, &*state.hasher, request).await?;
    Ok(Json(summary))
}

async fn login<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = request.username.clone();
    let outcome = service::login(&*state.accounts, &*state.hasher, state.authority(), request)
        .await
        .inspect_err(|e| tracing::warn!(username = %username, error = %e, "API login failed"))?;
    Ok(Json(outcome.into()))
}

// ── Tasks ──────────────────────────────────────────────────────────

async fn list_tasks<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    ApiUser(user): ApiUser,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(service::list_tasks(&*state.tasks, user.user_id).await?))
}

async fn create_task<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    ApiUser(user): ApiUser,
    ApiJson(draft): ApiJson<TaskDraft>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task =
        service::create_task(&*state.accounts, &*state.tasks, user.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    ApiUser(user): ApiUser,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(service::get_task(&*state.tasks, id, user.user_id).await?))
}

async fn update_task<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    ApiUser(user): ApiUser,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(
        service::update_task(&*state.tasks, id, patch, user.user_id).await?,
    ))
}

async fn delete_task<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    ApiUser(user): ApiUser,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<StatusCode, ApiError> {
    service::delete_task(&*state.tasks, id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Stats ──────────────────────────────────────────────────────────

async fn stats<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    ApiUser(user): ApiUser,
) -> Result<Json<ScoreSnapshot>, ApiError> {
    let today = OffsetDateTime::now_utc().date();
    Ok(Json(
        service::snapshot(&*state.tasks, user.user_id, today).await?,
    ))
}
