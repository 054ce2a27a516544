use std::future::Future;

use super::types::{NewSession, SessionRecord};
use crate::task::{NewTask, Task};
use crate::types::{Account, NewAccount, SessionId, TaskId, UserId};

/// Error type returned by consumer-provided stores.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Uniqueness conflict reported by [`AccountStore::save`].
///
/// Stores return it boxed inside [`StoreError`] when a concurrent registration took the
/// username or email between the existence checks and the insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UniqueViolation {
    #[error("Username already exists")]
    Username,
    #[error("Email already exists")]
    Email,
}

/// Consumer-provided account persistence.
///
/// Lookups are live: the identity resolver calls [`find_by_id`](Self::find_by_id) on every
/// authenticated request so a credential never outlives its account.
pub trait AccountStore: Send + Sync + 'static {
    fn exists_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn exists_by_email(&self, email: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send;

    fn find_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send;

    /// Persist a new account and assign its id.
    ///
    /// Fails with a boxed [`UniqueViolation`] if the username or email is already taken.
    fn save(&self, account: NewAccount) -> impl Future<Output = Result<Account, StoreError>> + Send;
}

/// Consumer-provided task persistence. Every lookup is scoped to an owner.
pub trait TaskStore: Send + Sync + 'static {
    fn find_all_by_owner(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Returns `None` both for unknown ids and for tasks owned by someone else.
    fn find_by_id_and_owner(
        &self,
        id: TaskId,
        owner: UserId,
    ) -> impl Future<Output = Result<Option<Task>, StoreError>> + Send;

    /// Insert a task, assigning `id` and `created_at`.
    fn create(
        &self,
        owner: UserId,
        task: NewTask,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Overwrite an existing task.
    fn save(&self, task: Task) -> impl Future<Output = Result<Task, StoreError>> + Send;

    fn delete(&self, task: &Task) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Consumer-provided browser session persistence.
///
/// Sessions are identified by opaque ids carried in the encrypted session cookie.
pub trait SessionStore: Send + Sync + 'static {
    /// Create a new session. Returns the session ID.
    fn create(
        &self,
        session: NewSession,
    ) -> impl Future<Output = Result<SessionId, StoreError>> + Send;

    /// Look up a session by ID.
    fn find(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>, StoreError>> + Send;

    /// Drop the embedded credential but keep the session.
    fn clear_credential(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Destroy the session entirely.
    fn delete(&self, session_id: &SessionId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Password hashing collaborator.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Salted, slow hash of `password` in a self-describing format.
    fn hash(&self, password: &str) -> Result<String, StoreError>;

    fn verify(&self, password: &str, hash: &str) -> bool;
}
