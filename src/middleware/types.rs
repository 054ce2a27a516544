use time::OffsetDateTime;

use crate::token::Credential;

/// Session data from a successful UI login or registration.
///
/// Passed to [`SessionStore::create`](super::SessionStore::create) for the consumer to persist.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Bearer credential issued at login; re-validated on every gated request.
    pub credential: Credential,
    /// Display name for page headers.
    pub username: String,
    /// Client `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// End of the session's life: the expiry of the credential it was created with.
    pub expires_at: OffsetDateTime,
}

/// Stored session state, as returned by [`SessionStore::find`](super::SessionStore::find).
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// `None` once the credential has been cleared.
    pub credential: Option<Credential>,
    pub username: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub expires_at: OffsetDateTime,
}

impl SessionRecord {
    /// Stores may drop expired records; nothing in them can be admitted any more.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

impl From<NewSession> for SessionRecord {
    fn from(session: NewSession) -> Self {
        Self {
            credential: Some(session.credential),
            username: Some(session.username),
            user_agent: session.user_agent,
            ip_address: session.ip_address,
            expires_at: session.expires_at,
        }
    }
}
