use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use super::error::AuthError;
use super::resolver::{EntryPoint, IdentityResolver};
use super::traits::AccountStore;
use crate::error::IdentityError;
use crate::token::Credential;
use crate::types::Identity;

/// Extracts the credential from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively; anything else yields `None`.
#[must_use]
pub fn bearer_credential(headers: &HeaderMap) -> Option<Credential> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| Credential::new(token))
}

/// Stateless per-request gate for the API surface.
pub struct RequestAuthGate<'a, A> {
    resolver: &'a IdentityResolver<A>,
}

impl<'a, A: AccountStore> RequestAuthGate<'a, A> {
    #[must_use]
    pub fn new(resolver: &'a IdentityResolver<A>) -> Self {
        Self { resolver }
    }

    /// Authenticates one API request from its headers.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] for a missing, malformed, expired or orphaned
    /// credential; [`AuthError::Store`] if the account lookup itself fails.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let credential = bearer_credential(headers).ok_or(AuthError::Unauthenticated)?;
        match self.resolver.resolve(&credential, EntryPoint::Api).await {
            Ok(identity) => Ok(identity),
            Err(IdentityError::Store(e)) => Err(AuthError::Store(e)),
            Err(_) => Err(AuthError::Unauthenticated),
        }
    }
}
