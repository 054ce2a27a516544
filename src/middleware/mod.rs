//! Dual-surface authentication for Axum.
//!
//! One [`IdentityResolver`] turns a bearer credential into a live [`Identity`](crate::types::Identity).
//! Two gates consume it:
//!
//! - [`RequestAuthGate`] reads `Authorization: Bearer` on every API request (extractor: [`ApiUser`]).
//! - [`SessionBridge`] keeps the credential in a server-side session behind an encrypted
//!   cookie and re-resolves it on every page request (extractor: [`SessionUser`]).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use taskdeck::middleware::{AppState, TaskdeckConfig};
//!
//! // 1. Implement AccountStore, TaskStore and SessionStore for your app
//! // 2. Configure from environment
//! let config = TaskdeckConfig::from_env()?;
//!
//! // 3. Build state and mount everything
//! let state = AppState::new(config, accounts, tasks, sessions, hasher);
//! let app = taskdeck::web::router(state);
//! ```

mod bridge;
mod config;
mod cookies;
mod error;
mod extractor;
mod gate;
mod resolver;
mod routes;
mod state;
mod traits;
mod types;

pub use bridge::{BridgeRejection, SessionBridge};
pub use config::TaskdeckConfig;
pub use error::AuthError;
pub use extractor::{ApiUser, SessionUser};
pub use gate::{RequestAuthGate, bearer_credential};
pub use resolver::{EntryPoint, IdentityResolver};
pub use routes::session_routes;
pub use state::AppState;
pub use traits::{AccountStore, PasswordHasher, SessionStore, StoreError, TaskStore, UniqueViolation};
pub use types::{NewSession, SessionRecord};

pub(crate) use cookies::session_id;
pub(crate) use error::redirect;
pub(crate) use extractor::is_htmx;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
