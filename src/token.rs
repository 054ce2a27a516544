use pasetors::claims::Claims;
use pasetors::keys::{AsymmetricKeyPair, AsymmetricPublicKey, AsymmetricSecretKey, Generate};
use pasetors::token::UntrustedToken;
use pasetors::version4::{PublicToken, V4};
use pasetors::{Public, public};
use serde_json::Value as JsonValue;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::error::{CredentialError, Error};
use crate::types::{Identity, UserId};

const TOKEN_PREFIX: &str = "v4.public.";
const USER_ID_CLAIM: &str = "uid";

/// Default lifetime of an issued credential.
pub const DEFAULT_TTL: Duration = Duration::hours(24);

/// Signed bearer credential (PASETO `v4.public`).
///
/// The same string travels in the `Authorization` header for API clients and sits in the
/// server-side session for browser clients.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Claims recovered from a credential whose signature and expiry checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSubject {
    pub username: String,
    pub user_id: UserId,
    pub expires_at: OffsetDateTime,
}

/// Issues and verifies credentials with an Ed25519 key pair.
///
/// Stateless: verification needs only the public half, no lookups.
pub struct CredentialAuthority {
    secret: AsymmetricSecretKey<V4>,
    public: AsymmetricPublicKey<V4>,
    ttl: Duration,
}

impl std::fmt::Debug for CredentialAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialAuthority")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialAuthority {
    /// Creates an authority with a freshly generated key pair.
    ///
    /// Credentials issued by it die with the process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Key`] if key generation fails.
    pub fn generate(ttl: Duration) -> Result<Self, Error> {
        let pair =
            AsymmetricKeyPair::<V4>::generate().map_err(|e| Error::Key(e.to_string()))?;
        Ok(Self {
            secret: pair.secret,
            public: pair.public,
            ttl,
        })
    }

    /// Loads an authority from a hex-encoded 64-byte secret key (seed followed by public key).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Key`] if the hex is invalid, the length is wrong, or the two halves
    /// do not belong together.
    pub fn from_secret_key_hex(secret_key_hex: &str, ttl: Duration) -> Result<Self, Error> {
        let bytes = hex::decode(secret_key_hex.trim())
            .map_err(|e| Error::Key(format!("invalid hex: {e}")))?;
        if bytes.len() != 64 {
            return Err(Error::Key(format!(
                "invalid key length: expected 64, got {}",
                bytes.len()
            )));
        }

        let secret =
            AsymmetricSecretKey::<V4>::from(&bytes).map_err(|e| Error::Key(e.to_string()))?;
        let public = AsymmetricPublicKey::<V4>::from(&bytes[32..])
            .map_err(|e| Error::Key(e.to_string()))?;

        let authority = Self { secret, public, ttl };
        authority.self_check()?;
        Ok(authority)
    }

    /// Hex encoding of the secret key, accepted by [`from_secret_key_hex`](Self::from_secret_key_hex).
    #[must_use]
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret.as_bytes())
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a credential for `identity` expiring one TTL from now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] if the claims cannot be built or signed.
    pub fn issue(&self, identity: &Identity) -> Result<Credential, Error> {
        self.issue_at(identity, OffsetDateTime::now_utc())
    }

    /// Issues a credential as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] if the claims cannot be built or signed.
    pub fn issue_at(&self, identity: &Identity, now: OffsetDateTime) -> Result<Credential, Error> {
        let signing = |e: pasetors::errors::Error| Error::Signing(e.to_string());

        let issued_at = rfc3339(now)?;
        let expires_at = rfc3339(now + self.ttl)?;

        let mut claims = Claims::new().map_err(signing)?;
        claims.issued_at(&issued_at).map_err(signing)?;
        claims.not_before(&issued_at).map_err(signing)?;
        claims.expiration(&expires_at).map_err(signing)?;
        claims.subject(&identity.username).map_err(signing)?;
        claims
            .add_additional(USER_ID_CLAIM, identity.user_id.0)
            .map_err(signing)?;

        let token = public::sign(&self.secret, &claims, None, None).map_err(signing)?;
        Ok(Credential(token))
    }

    /// Verifies signature first, then expiry.
    ///
    /// # Errors
    ///
    /// [`CredentialError::Malformed`] for anything that is not a well-formed token with the
    /// expected claims, [`CredentialError::SignatureInvalid`] when the signature does not
    /// verify against this authority's key, [`CredentialError::Expired`] when `exp` has passed.
    pub fn verify(&self, credential: &Credential) -> Result<VerifiedSubject, CredentialError> {
        self.verify_at(credential, OffsetDateTime::now_utc())
    }

    /// [`verify`](Self::verify) evaluated at `now`.
    ///
    /// # Errors
    ///
    /// Same as [`verify`](Self::verify).
    pub fn verify_at(
        &self,
        credential: &Credential,
        now: OffsetDateTime,
    ) -> Result<VerifiedSubject, CredentialError> {
        let token_str = credential.as_str();
        if !token_str.starts_with(TOKEN_PREFIX) {
            return Err(CredentialError::Malformed("invalid token format".into()));
        }

        let untrusted_token = UntrustedToken::<Public, V4>::try_from(token_str)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;

        // Signature only; claims are checked below so `Expired` stays distinct and `now` applies.
        let trusted_token = PublicToken::verify(&self.public, &untrusted_token, None, None)
            .map_err(|_| CredentialError::SignatureInvalid)?;

        let claims = Claims::from_string(trusted_token.payload())
            .map_err(|_| CredentialError::Malformed("payload is not a claims object".into()))?;

        let username = claims
            .get_claim("sub")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CredentialError::Malformed("missing claim: sub".into()))?
            .to_owned();
        let user_id = claims
            .get_claim(USER_ID_CLAIM)
            .and_then(JsonValue::as_i64)
            .map(UserId)
            .ok_or_else(|| CredentialError::Malformed("missing claim: uid".into()))?;
        let expires_at = claims
            .get_claim("exp")
            .and_then(JsonValue::as_str)
            .and_then(|exp| OffsetDateTime::parse(exp, &Rfc3339).ok())
            .ok_or_else(|| CredentialError::Malformed("missing claim: exp".into()))?;

        if expires_at <= now {
            return Err(CredentialError::Expired);
        }

        Ok(VerifiedSubject {
            username,
            user_id,
            expires_at,
        })
    }

    /// Non-failing probe for read-only checks.
    #[must_use]
    pub fn is_live(&self, credential: &Credential) -> bool {
        self.verify(credential).is_ok()
    }

    fn self_check(&self) -> Result<(), Error> {
        let key_check = Identity {
            user_id: UserId(0),
            username: "key-check".into(),
        };
        let credential = self.issue(&key_check)?;
        self.verify(&credential)
            .map(|_| ())
            .map_err(|_| Error::Key("secret and public key halves do not match".into()))
    }
}

fn rfc3339(at: OffsetDateTime) -> Result<String, Error> {
    at.format(&Rfc3339)
        .map_err(|e| Error::Signing(format!("timestamp formatting: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> CredentialAuthority {
        CredentialAuthority::generate(DEFAULT_TTL).unwrap()
    }

    fn alice() -> Identity {
        Identity {
            user_id: UserId(1),
            username: "alice".into(),
        }
    }

    #[test]
    fn issued_credential_verifies_with_same_subject() {
        let authority = authority();
        let credential = authority.issue(&alice()).unwrap();

        assert!(credential.as_str().starts_with(TOKEN_PREFIX));
        let subject = authority.verify(&credential).unwrap();
        assert_eq!(subject.username, "alice");
        assert_eq!(subject.user_id, UserId(1));
    }

    #[test]
    fn expiry_is_one_ttl_after_issuance() {
        let authority = CredentialAuthority::generate(Duration::hours(2)).unwrap();
        let now = OffsetDateTime::now_utc();
        let credential = authority.issue_at(&alice(), now).unwrap();

        let subject = authority.verify_at(&credential, now).unwrap();
        let drift = (subject.expires_at - (now + Duration::hours(2))).abs();
        assert!(drift < Duration::seconds(1));
    }

    #[test]
    fn expired_credential_is_rejected_as_expired() {
        let authority = authority();
        let issued = OffsetDateTime::now_utc() - Duration::days(2);
        let credential = authority.issue_at(&alice(), issued).unwrap();

        assert_eq!(authority.verify(&credential), Err(CredentialError::Expired));
        assert!(!authority.is_live(&credential));
    }

    #[test]
    fn verification_uses_the_given_instant() {
        let authority = authority();
        let issued = OffsetDateTime::now_utc() - Duration::days(2);
        let credential = authority.issue_at(&alice(), issued).unwrap();

        let subject = authority
            .verify_at(&credential, issued + Duration::hours(1))
            .unwrap();
        assert_eq!(subject.user_id, UserId(1));
        assert_eq!(
            authority.verify_at(&credential, issued + Duration::days(1) + Duration::seconds(1)),
            Err(CredentialError::Expired)
        );
    }

    #[test]
    fn credential_expires_exactly_at_boundary() {
        let authority = authority();
        let now = OffsetDateTime::now_utc();
        let credential = authority.issue_at(&alice(), now).unwrap();

        assert!(authority
            .verify_at(&credential, now + DEFAULT_TTL - Duration::seconds(1))
            .is_ok());
        assert_eq!(
            authority.verify_at(&credential, now + DEFAULT_TTL + Duration::seconds(1)),
            Err(CredentialError::Expired)
        );
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let issuer = authority();
        let verifier = authority();
        let credential = issuer.issue(&alice()).unwrap();

        assert_eq!(
            verifier.verify(&credential),
            Err(CredentialError::SignatureInvalid)
        );
    }

    #[test]
    fn expired_foreign_credential_reports_signature_first() {
        let issuer = authority();
        let verifier = authority();
        let issued = OffsetDateTime::now_utc() - Duration::days(3);
        let credential = issuer.issue_at(&alice(), issued).unwrap();

        assert_eq!(
            verifier.verify(&credential),
            Err(CredentialError::SignatureInvalid)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let authority = authority();
        let token = authority.issue(&alice()).unwrap().as_str().to_owned();

        let idx = TOKEN_PREFIX.len() + 10;
        let original = token.as_bytes()[idx];
        let replacement = if original == b'A' { 'B' } else { 'A' };
        let mut tampered = token.clone();
        tampered.replace_range(idx..=idx, &replacement.to_string());

        assert!(authority.verify(&Credential::new(tampered)).is_err());
        assert!(authority.verify(&Credential::new(token)).is_ok());
    }

    #[test]
    fn garbage_is_malformed() {
        let authority = authority();
        for token in ["", "not-a-token", "v2.local.abc", "v4.public.!!!"] {
            assert!(
                matches!(
                    authority.verify(&Credential::new(token)),
                    Err(CredentialError::Malformed(_))
                ),
                "expected malformed for {token:?}"
            );
        }
    }

    #[test]
    fn is_live_never_fails() {
        let authority = authority();
        assert!(!authority.is_live(&Credential::new("garbage")));
        assert!(authority.is_live(&authority.issue(&alice()).unwrap()));
    }

    #[test]
    fn secret_key_hex_roundtrip_keeps_credentials_valid() {
        let first = authority();
        let credential = first.issue(&alice()).unwrap();

        let reloaded =
            CredentialAuthority::from_secret_key_hex(&first.secret_key_hex(), DEFAULT_TTL)
                .unwrap();
        assert_eq!(reloaded.verify(&credential).unwrap().username, "alice");
    }

    #[test]
    fn rejects_bad_secret_key_hex() {
        assert!(matches!(
            CredentialAuthority::from_secret_key_hex("zz", DEFAULT_TTL),
            Err(Error::Key(_))
        ));
        assert!(matches!(
            CredentialAuthority::from_secret_key_hex(&"ab".repeat(32), DEFAULT_TTL),
            Err(Error::Key(_))
        ));
    }

    #[test]
    fn debug_output_hides_token() {
        let credential = Credential::new("v4.public.secret-bits");
        assert_eq!(format!("{credential:?}"), "Credential(..)");
    }
}
