//! Account and task operations shared by the JSON API and the browser UI.
//!
//! Every task operation is scoped to the acting user's id; another user's task is
//! indistinguishable from a missing one.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::ServiceError;
use crate::middleware::{AccountStore, PasswordHasher, TaskStore, UniqueViolation};
use crate::scoring::{self, ScoreSnapshot};
use crate::task::{Task, TaskDraft, TaskPatch};
use crate::token::{Credential, CredentialAuthority};
use crate::types::{AccountSummary, Identity, NewAccount, TaskId, UserId};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login: a fresh credential for the account.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub credential: Credential,
    pub identity: Identity,
}

/// JSON body returned by `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub username: String,
}

impl From<LoginOutcome> for TokenResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            token: outcome.credential.as_str().to_owned(),
            username: outcome.identity.username,
        }
    }
}

fn require_present(fields: &[(&str, &str)]) -> Result<(), ServiceError> {
    let blank: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| format!("{name}: must not be blank"))
        .collect();
    if blank.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(blank.join(", ")))
    }
}

// ── Accounts ───────────────────────────────────────────────────────

/// Creates an account.
///
/// # Errors
///
/// [`ServiceError::Validation`] for blank fields, [`ServiceError::DuplicateAccount`] if the
/// username or email is taken.
pub async fn register<A: AccountStore>(
    accounts: &A,
    hasher: &dyn PasswordHasher,
    request: RegisterRequest,
) -> Result<AccountSummary, ServiceError> {
    require_present(&[
        ("username", request.username.as_str()),
        ("email", request.email.as_str()),
        ("password", request.password.as_str()),
    ])?;

    if accounts
        .exists_by_username(&request.username)
        .await
        .map_err(ServiceError::store)?
    {
        return Err(ServiceError::DuplicateAccount("Username already exists".into()));
    }
    if accounts
        .exists_by_email(&request.email)
        .await
        .map_err(ServiceError::store)?
    {
        return Err(ServiceError::DuplicateAccount("Email already exists".into()));
    }

    let password_hash = hasher.hash(&request.password).map_err(ServiceError::store)?;
    let account = accounts
        .save(NewAccount {
            password_hash,
            username: request.username,
            email: request.email,
        })
        .await
        .map_err(|e| match e.downcast_ref::<UniqueViolation>() {
            Some(violation) => ServiceError::DuplicateAccount(violation.to_string()),
            None => ServiceError::store(e),
        })?;

    tracing::info!(user_id = %account.id, username = %account.username, "Account registered");
    Ok(account.summary())
}

/// Checks a username/password pair and issues a credential.
///
/// # Errors
///
/// [`ServiceError::BadCredentials`] for an unknown user or a wrong password; the two are
/// not distinguished.
pub async fn login<A: AccountStore>(
    accounts: &A,
    hasher: &dyn PasswordHasher,
    authority: &CredentialAuthority,
    request: LoginRequest,
) -> Result<LoginOutcome, ServiceError> {
    require_present(&[
        ("username", request.username.as_str()),
        ("password", request.password.as_str()),
    ])?;

    let account = accounts
        .find_by_username(&request.username)
        .await
        .map_err(ServiceError::store)?
        .filter(|account| hasher.verify(&request.password, &account.password_hash))
        .ok_or(ServiceError::BadCredentials)?;

    let identity = account.identity();
    let credential = authority.issue(&identity)?;
    Ok(LoginOutcome {
        credential,
        identity,
    })
}

// ── Tasks ──────────────────────────────────────────────────────────

fn task_not_found(id: TaskId) -> ServiceError {
    ServiceError::NotFound(format!("Task not found with id: {id}"))
}

async fn owned_task<T: TaskStore>(
    tasks: &T,
    id: TaskId,
    owner: UserId,
) -> Result<Task, ServiceError> {
    tasks
        .find_by_id_and_owner(id, owner)
        .await
        .map_err(ServiceError::store)?
        .ok_or_else(|| task_not_found(id))
}

/// # Errors
///
/// [`ServiceError::Validation`] for a blank title, [`ServiceError::NotFound`] if the
/// owner no longer exists.
pub async fn create_task<A: AccountStore, T: TaskStore>(
    accounts: &A,
    tasks: &T,
    owner: UserId,
    draft: TaskDraft,
) -> Result<Task, ServiceError> {
    let new_task = draft.into_new_task()?;
    if accounts
        .find_by_id(owner)
        .await
        .map_err(ServiceError::store)?
        .is_none()
    {
        return Err(ServiceError::NotFound(format!("User not found with id: {owner}")));
    }
    tasks
        .create(owner, new_task)
        .await
        .map_err(ServiceError::store)
}

/// # Errors
///
/// [`ServiceError::Store`] if the store fails.
pub async fn list_tasks<T: TaskStore>(tasks: &T, owner: UserId) -> Result<Vec<Task>, ServiceError> {
    tasks
        .find_all_by_owner(owner)
        .await
        .map_err(ServiceError::store)
}

/// # Errors
///
/// [`ServiceError::NotFound`] if the task does not exist for `owner`.
pub async fn get_task<T: TaskStore>(tasks: &T, id: TaskId, owner: UserId) -> Result<Task, ServiceError> {
    owned_task(tasks, id, owner).await
}

/// Applies a partial update; absent fields keep their stored value.
///
/// # Errors
///
/// [`ServiceError::NotFound`] if the task does not exist for `owner`,
/// [`ServiceError::Validation`] for a blank title.
pub async fn update_task<T: TaskStore>(
    tasks: &T,
    id: TaskId,
    patch: TaskPatch,
    owner: UserId,
) -> Result<Task, ServiceError> {
    let mut task = owned_task(tasks, id, owner).await?;
    patch.apply(&mut task)?;
    tasks.save(task).await.map_err(ServiceError::store)
}

/// # Errors
///
/// [`ServiceError::NotFound`] if the task does not exist for `owner`.
pub async fn delete_task<T: TaskStore>(tasks: &T, id: TaskId, owner: UserId) -> Result<(), ServiceError> {
    let task = owned_task(tasks, id, owner).await?;
    tasks.delete(&task).await.map_err(ServiceError::store)
}

/// Scores the owner's current task set as of `today`.
///
/// # Errors
///
/// [`ServiceError::Store`] if the store fails.
pub async fn snapshot<T: TaskStore>(
    tasks: &T,
    owner: UserId,
    today: Date,
) -> Result<ScoreSnapshot, ServiceError> {
    let tasks = list_tasks(tasks, owner).await?;
    Ok(scoring::score(&tasks, today))
}
