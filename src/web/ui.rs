use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::Form;
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use time::OffsetDateTime;

use super::pages;
use crate::error::ServiceError;
use crate::middleware::{AccountStore, AppState, SessionStore, SessionUser, TaskStore, is_htmx, redirect, session_id};
use crate::service;
use crate::task::{Priority, TaskDraft, TaskPatch, TaskStatus, parse_date};
use crate::types::TaskId;

/// Browser pages and htmx task fragments.
pub fn ui_routes<A, T, S>() -> Router<AppState<A, T, S>>
where
    A: AccountStore,
    T: TaskStore,
    S: SessionStore,
{
    Router::new()
        .route("/", get(index::<A, T, S>))
        .route("/login", get(login_page::<A, T, S>))
        .route("/register", get(register_page::<A, T, S>))
        .route("/dashboard", get(dashboard::<A, T, S>))
        .route("/stats", get(stats_page::<A, T, S>))
        .route("/ui/tasks/list", get(list_fragment::<A, T, S>))
        .route("/ui/tasks/create", post(create_fragment::<A, T, S>))
        .route("/ui/tasks/update", post(update_fragment::<A, T, S>))
        .route("/ui/tasks/{id}", delete(delete_fragment::<A, T, S>))
        .route("/ui/tasks/{id}/done", post(mark_done::<A, T, S>))
        .route("/ui/tasks/{id}/status", post(move_task::<A, T, S>))
}

/// Failure of a gated UI action: back to the dashboard with the message.
pub(crate) struct UiError {
    error: ServiceError,
    htmx: bool,
}

impl UiError {
    fn new(error: ServiceError, headers: &HeaderMap) -> Self {
        Self {
            error,
            htmx: is_htmx(headers),
        }
    }
}

impl IntoResponse for UiError {
    fn into_response(self) -> Response {
        let message = match self.error {
            ServiceError::NotFound(m) | ServiceError::Validation(m) | ServiceError::DuplicateAccount(m) => m,
            ServiceError::BadCredentials => ServiceError::BadCredentials.to_string(),
            other => {
                tracing::error!(error = %other, "Unexpected error");
                "An unexpected error occurred".into()
            }
        };
        let to = format!("/dashboard?error={}", urlencoding::encode(&message));
        redirect(&to, self.htmx)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    error: Option<String>,
}

// ── Public pages ───────────────────────────────────────────────────

/// Whether the visitor already holds a live session.
async fn signed_in<A: AccountStore, T: TaskStore, S: SessionStore>(
    state: &AppState<A, T, S>,
    jar: &PrivateCookieJar,
) -> bool {
    let session_id = session_id(jar, &state.settings.session_cookie_name);
    state.bridge().probe(session_id.as_ref()).await.is_some()
}

async fn index<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    jar: PrivateCookieJar,
) -> Response {
    if signed_in(&state, &jar).await {
        return Redirect::to(&state.settings.landing_path).into_response();
    }
    Html(pages::index()).into_response()
}

async fn login_page<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    jar: PrivateCookieJar,
    Query(params): Query<PageParams>,
) -> Response {
    if signed_in(&state, &jar).await {
        return Redirect::to(&state.settings.landing_path).into_response();
    }
    Html(pages::login(params.error.as_deref())).into_response()
}

async fn register_page<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    jar: PrivateCookieJar,
    Query(params): Query<PageParams>,
) -> Response {
    if signed_in(&state, &jar).await {
        return Redirect::to(&state.settings.landing_path).into_response();
    }
    Html(pages::register(params.error.as_deref())).into_response()
}

// ── Gated pages ────────────────────────────────────────────────────

async fn dashboard<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    user: SessionUser,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, UiError> {
    let tasks = service::list_tasks(&*state.tasks, user.identity.user_id)
        .await
        .map_err(|e| UiError::new(e, &headers))?;
    Ok(Html(pages::dashboard(
        &user.display_name,
        &tasks,
        params.error.as_deref(),
    )))
}

async fn stats_page<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    user: SessionUser,
    headers: HeaderMap,
) -> Result<Html<String>, UiError> {
    let today = OffsetDateTime::now_utc().date();
    let snapshot = service::snapshot(&*state.tasks, user.identity.user_id, today)
        .await
        .map_err(|e| UiError::new(e, &headers))?;
    Ok(Html(pages::stats(&user.display_name, &snapshot)))
}

// ── Task fragments ─────────────────────────────────────────────────

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct CreateForm {
    #[serde(default)]
    title: String,
    description: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    #[serde(rename = "dueDate")]
    due_date: Option<String>,
}

impl CreateForm {
    fn into_draft(self) -> Result<TaskDraft, ServiceError> {
        Ok(TaskDraft {
            title: self.title,
            description: non_blank(self.description),
            status: non_blank(self.status).map(|s| s.parse::<TaskStatus>()).transpose()?,
            priority: non_blank(self.priority).map(|p| p.parse::<Priority>()).transpose()?,
            due_date: non_blank(self.due_date)
                .map(|d| parse_date("dueDate", &d))
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UpdateForm {
    #[serde(rename = "taskId")]
    task_id: TaskId,
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    #[serde(rename = "dueDate")]
    due_date: Option<String>,
}

impl UpdateForm {
    fn into_patch(self) -> Result<(TaskId, TaskPatch), ServiceError> {
        let patch = TaskPatch {
            title: self.title,
            description: self.description,
            status: non_blank(self.status).map(|s| s.parse::<TaskStatus>()).transpose()?,
            priority: non_blank(self.priority).map(|p| p.parse::<Priority>()).transpose()?,
            due_date: non_blank(self.due_date)
                .map(|d| parse_date("dueDate", &d))
                .transpose()?,
        };
        Ok((self.task_id, patch))
    }
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    status: String,
}

async fn task_list_html<T: TaskStore>(
    tasks: &T,
    user: &SessionUser,
) -> Result<Html<String>, ServiceError> {
    let tasks = service::list_tasks(tasks, user.identity.user_id).await?;
    Ok(Html(pages::task_list(&tasks)))
}

async fn list_fragment<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    user: SessionUser,
    headers: HeaderMap,
) -> Result<Html<String>, UiError> {
    task_list_html(&*state.tasks, &user)
        .await
        .map_err(|e| UiError::new(e, &headers))
}

async fn create_fragment<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    user: SessionUser,
    headers: HeaderMap,
    Form(form): Form<CreateForm>,
) -> Result<Html<String>, UiError> {
    let owner = user.identity.user_id;
    async {
        let draft = form.into_draft()?;
        service::create_task(&*state.accounts, &*state.tasks, owner, draft).await?;
        task_list_html(&*state.tasks, &user).await
    }
    .await
    .map_err(|e| UiError::new(e, &headers))
}

async fn update_fragment<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    user: SessionUser,
    headers: HeaderMap,
    Form(form): Form<UpdateForm>,
) -> Result<Html<String>, UiError> {
    let owner = user.identity.user_id;
    async {
        let (id, patch) = form.into_patch()?;
        service::update_task(&*state.tasks, id, patch, owner).await?;
        task_list_html(&*state.tasks, &user).await
    }
    .await
    .map_err(|e| UiError::new(e, &headers))
}

async fn delete_fragment<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    user: SessionUser,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
) -> Result<Html<String>, UiError> {
    async {
        service::delete_task(&*state.tasks, id, user.identity.user_id).await?;
        task_list_html(&*state.tasks, &user).await
    }
    .await
    .map_err(|e| UiError::new(e, &headers))
}

async fn mark_done<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    user: SessionUser,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
) -> Result<Html<String>, UiError> {
    async {
        let patch = TaskPatch::status(TaskStatus::Done);
        service::update_task(&*state.tasks, id, patch, user.identity.user_id).await?;
        task_list_html(&*state.tasks, &user).await
    }
    .await
    .map_err(|e| UiError::new(e, &headers))
}

/// Drag-and-drop status change. No fragment: the board already moved the card.
async fn move_task<A: AccountStore, T: TaskStore, S: SessionStore>(
    State(state): State<AppState<A, T, S>>,
    user: SessionUser,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
    Form(form): Form<StatusForm>,
) -> Result<StatusCode, UiError> {
    async {
        let patch = TaskPatch::status(form.status.parse::<TaskStatus>()?);
        service::update_task(&*state.tasks, id, patch, user.identity.user_id).await
    }
    .await
    .map_err(|e| UiError::new(e, &headers))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn create_form_treats_blanks_as_absent() {
        let draft = CreateForm {
            title: "Ship".into(),
            description: Some("".into()),
            priority: Some("high".into()),
            status: Some(" ".into()),
            due_date: Some("2026-05-01".into()),
        }
        .into_draft()
        .unwrap();
        assert_eq!(draft.description, None);
        assert_eq!(draft.priority, Some(Priority::High));
        assert_eq!(draft.status, None);
        assert_eq!(draft.due_date, Some(date!(2026 - 05 - 01)));
    }

    #[test]
    fn create_form_rejects_bad_values() {
        let form = || CreateForm {
            title: "x".into(),
            description: None,
            priority: None,
            status: None,
            due_date: None,
        };
        assert!(
            CreateForm {
                priority: Some("urgent".into()),
                ..form()
            }
            .into_draft()
            .is_err()
        );
        assert!(
            CreateForm {
                due_date: Some("tomorrow".into()),
                ..form()
            }
            .into_draft()
            .is_err()
        );
    }

    #[test]
    fn update_form_keeps_absent_fields_absent() {
        let (id, patch) = UpdateForm {
            task_id: TaskId(3),
            title: None,
            description: None,
            status: Some("DONE".into()),
            priority: Some("".into()),
            due_date: None,
        }
        .into_patch()
        .unwrap();
        assert_eq!(id, TaskId(3));
        assert_eq!(patch.status, Some(TaskStatus::Done));
        assert_eq!(patch.priority, None);
        assert_eq!(patch.title, None);
    }
}
