/// Credential authority setup and issuance failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Signing key error: {0}")]
    Key(String),
    #[error("Credential signing error: {0}")]
    Signing(String),
}

/// Why a credential failed verification.
///
/// Kept distinct so callers can react differently; the HTTP edge collapses all of them
/// into one unauthenticated outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("malformed credential: {0}")]
    Malformed(String),
    #[error("credential signature is invalid")]
    SignatureInvalid,
    #[error("credential has expired")]
    Expired,
}

/// Failure to turn a credential into a live identity.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Signature and expiry are fine but the account is gone.
    #[error("credential subject '{0}' no longer exists")]
    UnknownSubject(String),
    #[error(transparent)]
    CredentialInvalid(#[from] CredentialError),
    #[error("account lookup failed: {0}")]
    Store(String),
}

/// Account and task operation failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    DuplicateAccount(String),
    #[error("Invalid username or password")]
    BadCredentials,
    #[error("store error: {0}")]
    Store(String),
    #[error("credential issuance failed: {0}")]
    Issue(#[from] Error),
}

impl ServiceError {
    pub(crate) fn store(e: impl std::fmt::Display) -> Self {
        Self::Store(e.to_string())
    }
}
