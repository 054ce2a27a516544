use super::extractor::SessionUser;
use super::resolver::{EntryPoint, IdentityResolver};
use super::traits::{AccountStore, SessionStore};
use crate::error::IdentityError;
use crate::types::{Identity, SessionId};

/// Why a browser session was not admitted.
#[derive(Debug, thiserror::Error)]
pub enum BridgeRejection {
    #[error("no session")]
    NoSession,
    #[error("session holds no credential")]
    NoCredential,
    /// The stored credential failed resolution. The session has been destroyed.
    #[error("session credential rejected: {0}")]
    Invalid(#[source] IdentityError),
    #[error("session store error: {0}")]
    Store(String),
}

/// Carries a bearer credential inside a server-side session so browser pages get the
/// same validation as the API.
///
/// The session is only a vessel: every admission re-runs the full
/// [`IdentityResolver::resolve`] on the stored credential.
pub struct SessionBridge<'a, A, S> {
    resolver: &'a IdentityResolver<A>,
    sessions: &'a S,
}

impl<'a, A: AccountStore, S: SessionStore> SessionBridge<'a, A, S> {
    #[must_use]
    pub fn new(resolver: &'a IdentityResolver<A>, sessions: &'a S) -> Self {
        Self { resolver, sessions }
    }

    /// Gate for protected pages.
    ///
    /// Any credential failure (expired, tampered, account gone) destroys the session so
    /// the next request starts clean. A failing account store leaves it in place.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeRejection`] describing why the request must go to login.
    pub async fn admit(&self, session_id: Option<SessionId>) -> Result<SessionUser, BridgeRejection> {
        let Some(session_id) = session_id else {
            return Err(BridgeRejection::NoSession);
        };

        let record = self
            .sessions
            .find(&session_id)
            .await
            .map_err(|e| BridgeRejection::Store(e.to_string()))?
            .ok_or(BridgeRejection::NoSession)?;

        let Some(credential) = record.credential else {
            return Err(BridgeRejection::NoCredential);
        };

        match self.resolver.resolve(&credential, EntryPoint::Ui).await {
            Ok(identity) => {
                let display_name = record
                    .username
                    .unwrap_or_else(|| identity.username.clone());
                Ok(SessionUser {
                    session_id,
                    identity,
                    display_name,
                })
            }
            Err(IdentityError::Store(e)) => Err(BridgeRejection::Store(e)),
            Err(e) => {
                if let Err(err) = self.sessions.delete(&session_id).await {
                    tracing::error!(session_id = %session_id, error = %err, "Session deletion failed");
                }
                tracing::warn!(session_id = %session_id, error = %e, "Session credential rejected, session destroyed");
                Err(BridgeRejection::Invalid(e))
            }
        }
    }

    /// Soft check for public pages (login, register): is someone already signed in?
    ///
    /// Never fails. A dead credential is cleared from the session but the session stays.
    pub async fn probe(&self, session_id: Option<&SessionId>) -> Option<Identity> {
        let session_id = session_id?;
        let record = match self.sessions.find(session_id).await {
            Ok(record) => record?,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Session lookup failed");
                return None;
            }
        };
        let credential = record.credential?;

        if !self.resolver.authority().is_live(&credential) {
            self.clear_credential(session_id).await;
            return None;
        }

        match self.resolver.resolve(&credential, EntryPoint::Ui).await {
            Ok(identity) => Some(identity),
            Err(IdentityError::Store(e)) => {
                tracing::warn!(session_id = %session_id, error = %e, "Account lookup failed");
                None
            }
            Err(_) => {
                self.clear_credential(session_id).await;
                None
            }
        }
    }

    async fn clear_credential(&self, session_id: &SessionId) {
        if let Err(e) = self.sessions.clear_credential(session_id).await {
            tracing::warn!(session_id = %session_id, error = %e, "Clearing session credential failed");
        }
    }

    /// Destroys the session. Never fails.
    pub async fn logout(&self, session_id: Option<&SessionId>) {
        if let Some(session_id) = session_id {
            if let Err(e) = self.sessions.delete(session_id).await {
                tracing::warn!(error = %e, "Session deletion failed during logout");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::error::CredentialError;
    use crate::memory::{MemoryAccountStore, MemorySessionStore};
    use crate::middleware::{NewSession, SessionRecord};
    use crate::token::{Credential, CredentialAuthority, DEFAULT_TTL};
    use crate::types::NewAccount;

    struct Fixture {
        resolver: IdentityResolver<MemoryAccountStore>,
        accounts: Arc<MemoryAccountStore>,
        sessions: MemorySessionStore,
        alice: Identity,
    }

    impl Fixture {
        async fn new() -> Self {
            let accounts = Arc::new(MemoryAccountStore::default());
            let alice = accounts
                .save(NewAccount {
                    username: "alice".into(),
                    email: "alice@example.com".into(),
                    password_hash: "x".into(),
                })
                .await
                .unwrap()
                .identity();
            let authority = Arc::new(CredentialAuthority::generate(DEFAULT_TTL).unwrap());
            Self {
                resolver: IdentityResolver::new(authority, accounts.clone()),
                accounts,
                sessions: MemorySessionStore::default(),
                alice,
            }
        }

        fn bridge(&self) -> SessionBridge<'_, MemoryAccountStore, MemorySessionStore> {
            SessionBridge::new(&self.resolver, &self.sessions)
        }

        async fn session_with(&self, credential: Credential) -> SessionId {
            self.sessions
                .create(NewSession {
                    credential,
                    username: self.alice.username.clone(),
                    user_agent: None,
                    ip_address: None,
                    expires_at: OffsetDateTime::now_utc() + DEFAULT_TTL,
                })
                .await
                .unwrap()
        }

        async fn live_session(&self) -> SessionId {
            let credential = self.resolver.authority().issue(&self.alice).unwrap();
            self.session_with(credential).await
        }

        async fn expired_session(&self) -> SessionId {
            let issued = OffsetDateTime::now_utc() - Duration::days(2);
            let credential = self.resolver.authority().issue_at(&self.alice, issued).unwrap();
            self.session_with(credential).await
        }
    }

    #[tokio::test]
    async fn missing_or_unknown_session_is_rejected() {
        let fx = Fixture::new().await;
        assert!(matches!(
            fx.bridge().admit(None).await,
            Err(BridgeRejection::NoSession)
        ));
        assert!(matches!(
            fx.bridge().admit(Some(SessionId("nope".into()))).await,
            Err(BridgeRejection::NoSession)
        ));
    }

    #[tokio::test]
    async fn session_without_credential_is_rejected_but_kept() {
        let fx = Fixture::new().await;
        let id = SessionId("bare".into());
        fx.sessions.insert(
            id.clone(),
            SessionRecord {
                credential: None,
                username: Some("alice".into()),
                user_agent: None,
                ip_address: None,
                expires_at: OffsetDateTime::now_utc() + DEFAULT_TTL,
            },
        );

        assert!(matches!(
            fx.bridge().admit(Some(id.clone())).await,
            Err(BridgeRejection::NoCredential)
        ));
        assert!(fx.sessions.contains(&id));
    }

    #[tokio::test]
    async fn live_session_is_admitted() {
        let fx = Fixture::new().await;
        let id = fx.live_session().await;

        let user = fx.bridge().admit(Some(id.clone())).await.unwrap();
        assert_eq!(user.session_id, id);
        assert_eq!(user.identity, fx.alice);
        assert_eq!(user.display_name, "alice");
    }

    #[tokio::test]
    async fn expired_credential_destroys_session() {
        let fx = Fixture::new().await;
        let id = fx.expired_session().await;

        let rejection = fx.bridge().admit(Some(id.clone())).await.unwrap_err();
        assert!(matches!(
            rejection,
            BridgeRejection::Invalid(IdentityError::CredentialInvalid(CredentialError::Expired))
        ));
        assert!(!fx.sessions.contains(&id));
        assert!(matches!(
            fx.bridge().admit(Some(id)).await,
            Err(BridgeRejection::NoSession)
        ));
    }

    #[tokio::test]
    async fn deleted_account_destroys_session() {
        let fx = Fixture::new().await;
        let id = fx.live_session().await;
        fx.accounts.remove(fx.alice.user_id);

        let rejection = fx.bridge().admit(Some(id.clone())).await.unwrap_err();
        assert!(matches!(
            rejection,
            BridgeRejection::Invalid(IdentityError::UnknownSubject(_))
        ));
        assert!(!fx.sessions.contains(&id));
    }

    #[tokio::test]
    async fn tampered_credential_destroys_session() {
        let fx = Fixture::new().await;
        let id = fx.session_with(Credential::new("v4.public.garbage")).await;

        assert!(matches!(
            fx.bridge().admit(Some(id.clone())).await,
            Err(BridgeRejection::Invalid(_))
        ));
        assert!(!fx.sessions.contains(&id));
    }

    #[tokio::test]
    async fn probe_reports_live_identity() {
        let fx = Fixture::new().await;
        let id = fx.live_session().await;

        assert_eq!(fx.bridge().probe(Some(&id)).await, Some(fx.alice.clone()));
        assert_eq!(fx.bridge().probe(None).await, None);
    }

    #[tokio::test]
    async fn probe_clears_dead_credential_but_keeps_session() {
        let fx = Fixture::new().await;
        let id = fx.expired_session().await;

        assert_eq!(fx.bridge().probe(Some(&id)).await, None);
        let record = fx.sessions.find(&id).await.unwrap().unwrap();
        assert!(record.credential.is_none());
    }

    #[tokio::test]
    async fn logout_destroys_session() {
        let fx = Fixture::new().await;
        let id = fx.live_session().await;

        fx.bridge().logout(Some(&id)).await;
        assert!(!fx.sessions.contains(&id));
        fx.bridge().logout(None).await;
    }
}
