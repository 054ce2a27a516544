//! In-memory store implementations for the binary and the tests.
//!
//! Maps are guarded by `parking_lot` locks that are never held across an await.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use time::OffsetDateTime;
use ulid::Ulid;

use crate::middleware::{
    AccountStore, NewSession, SessionRecord, SessionStore, StoreError, TaskStore, UniqueViolation,
};
use crate::task::{NewTask, Task};
use crate::types::{Account, NewAccount, SessionId, TaskId, UserId};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Conflict(String);

// ── Accounts ───────────────────────────────────────────────────────

#[derive(Default)]
struct AccountTable {
    last_id: i64,
    rows: BTreeMap<UserId, Account>,
}

#[derive(Default)]
pub struct MemoryAccountStore {
    inner: RwLock<AccountTable>,
}

impl MemoryAccountStore {
    /// Removes an account. Existing credentials for it stop resolving.
    pub fn remove(&self, id: UserId) -> Option<Account> {
        self.inner.write().rows.remove(&id)
    }

    /// Changes an account's username in place, keeping its id.
    pub fn rename(&self, id: UserId, username: impl Into<String>) -> bool {
        match self.inner.write().rows.get_mut(&id) {
            Some(account) => {
                account.username = username.into();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccountStore for MemoryAccountStore {
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .any(|a| a.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(email)))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().rows.get(&id).cloned())
    }

    async fn save(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut table = self.inner.write();
        for row in table.rows.values() {
            if row.username == account.username {
                return Err(UniqueViolation::Username.into());
            }
            if row.email.eq_ignore_ascii_case(&account.email) {
                return Err(UniqueViolation::Email.into());
            }
        }
        table.last_id += 1;
        let id = UserId(table.last_id);
        let row = Account {
            id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }
}

// ── Tasks ──────────────────────────────────────────────────────────

#[derive(Default)]
struct TaskTable {
    last_id: i64,
    rows: BTreeMap<TaskId, Task>,
}

#[derive(Default)]
pub struct MemoryTaskStore {
    inner: RwLock<TaskTable>,
}

impl TaskStore for MemoryTaskStore {
    async fn find_all_by_owner(&self, owner: UserId) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect())
    }

    async fn find_by_id_and_owner(
        &self,
        id: TaskId,
        owner: UserId,
    ) -> Result<Option<Task>, StoreError> {
        Ok(self
            .inner
            .read()
            .rows
            .get(&id)
            .filter(|t| t.owner == owner)
            .cloned())
    }

    async fn create(&self, owner: UserId, task: NewTask) -> Result<Task, StoreError> {
        let mut table = self.inner.write();
        table.last_id += 1;
        let id = TaskId(table.last_id);
        let row = Task {
            id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: OffsetDateTime::now_utc(),
            owner,
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn save(&self, task: Task) -> Result<Task, StoreError> {
        let mut table = self.inner.write();
        match table.rows.get_mut(&task.id) {
            Some(row) if row.owner == task.owner => {
                *row = task.clone();
                Ok(task)
            }
            _ => Err(Conflict(format!("task {} does not exist", task.id)).into()),
        }
    }

    async fn delete(&self, task: &Task) -> Result<(), StoreError> {
        let mut table = self.inner.write();
        if table.rows.get(&task.id).is_some_and(|t| t.owner == task.owner) {
            table.rows.remove(&task.id);
        }
        Ok(())
    }
}

// ── Sessions ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.inner.read().contains_key(session_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a record under a caller-chosen id.
    pub fn insert(&self, session_id: SessionId, record: SessionRecord) {
        self.inner.write().insert(session_id, record);
    }

    /// Drops every record that expired before `now`. Returns how many went.
    pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
        let mut sessions = self.inner.write();
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now));
        before - sessions.len()
    }
}

impl SessionStore for MemorySessionStore {
    async fn create(&self, session: NewSession) -> Result<SessionId, StoreError> {
        let purged = self.purge_expired(OffsetDateTime::now_utc());
        if purged > 0 {
            tracing::debug!(purged, "Expired sessions dropped");
        }
        let id = SessionId(Ulid::new().to_string());
        self.inner.write().insert(id.clone(), session.into());
        Ok(id)
    }

    async fn find(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.inner.write();
        if sessions.get(session_id).is_some_and(|r| r.is_expired(now)) {
            sessions.remove(session_id);
            return Ok(None);
        }
        Ok(sessions.get(session_id).cloned())
    }

    async fn clear_credential(&self, session_id: &SessionId) -> Result<(), StoreError> {
        if let Some(record) = self.inner.write().get_mut(session_id) {
            record.credential = None;
        }
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.inner.write().remove(session_id);
        Ok(())
    }
}
