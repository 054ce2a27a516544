use std::sync::Arc;

use super::traits::AccountStore;
use crate::error::IdentityError;
use crate::token::{Credential, CredentialAuthority};
use crate::types::Identity;

/// Which surface a credential arrived on. Only used to tag logs: both surfaces get the
/// exact same validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum EntryPoint {
    #[display("api")]
    Api,
    #[display("ui")]
    Ui,
}

/// Turns a credential into a live [`Identity`]: signature and expiry via the
/// [`CredentialAuthority`], then an account lookup by the stable user id.
pub struct IdentityResolver<A> {
    authority: Arc<CredentialAuthority>,
    accounts: Arc<A>,
}

// Manual Clone: avoid derive adding an `A: Clone` bound.
impl<A> Clone for IdentityResolver<A> {
    fn clone(&self) -> Self {
        Self {
            authority: self.authority.clone(),
            accounts: self.accounts.clone(),
        }
    }
}

impl<A: AccountStore> IdentityResolver<A> {
    #[must_use]
    pub fn new(authority: Arc<CredentialAuthority>, accounts: Arc<A>) -> Self {
        Self {
            authority,
            accounts,
        }
    }

    #[must_use]
    pub fn authority(&self) -> &CredentialAuthority {
        &self.authority
    }

    /// Resolves `credential` to the account it names.
    ///
    /// # Errors
    ///
    /// [`IdentityError::CredentialInvalid`] if verification fails,
    /// [`IdentityError::UnknownSubject`] if the account no longer exists,
    /// [`IdentityError::Store`] if the lookup itself fails.
    pub async fn resolve(
        &self,
        credential: &Credential,
        entry_point: EntryPoint,
    ) -> Result<Identity, IdentityError> {
        let subject = self.authority.verify(credential).inspect_err(|e| {
            tracing::debug!(entry_point = %entry_point, error = %e, "Credential rejected");
        })?;

        let account = self
            .accounts
            .find_by_id(subject.user_id)
            .await
            .map_err(|e| IdentityError::Store(e.to_string()))?;

        match account {
            Some(account) => Ok(account.identity()),
            None => {
                tracing::warn!(
                    entry_point = %entry_point,
                    user_id = %subject.user_id,
                    username = %subject.username,
                    "Credential outlived its account"
                );
                Err(IdentityError::UnknownSubject(subject.username))
            }
        }
    }
}
