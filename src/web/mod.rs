//! HTTP surface: the JSON API, the browser pages and the session routes on one router.

mod api;
mod error;
mod pages;
mod ui;

pub use api::api_routes;
pub use error::{ApiError, ErrorBody};
pub use ui::ui_routes;

use axum::Router;

use crate::middleware::{AccountStore, AppState, SessionStore, TaskStore, session_routes};

/// Builds the complete application router.
pub fn router<A, T, S>(state: AppState<A, T, S>) -> Router
where
    A: AccountStore,
    T: TaskStore,
    S: SessionStore,
{
    Router::new()
        .merge(api_routes())
        .merge(ui_routes())
        .merge(session_routes())
        .with_state(state)
}
