use axum_extra::extract::cookie::Key;
use time::Duration;

use super::error::AuthError;
use crate::token::{CredentialAuthority, DEFAULT_TTL};

/// Shared settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct Settings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) secure_cookies: bool,
    pub(crate) login_path: String,
    pub(crate) register_path: String,
    pub(crate) landing_path: String,
}

impl Settings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "taskdeck_session".into(),
            secure_cookies: true,
            login_path: "/login".into(),
            register_path: "/register".into(),
            landing_path: "/dashboard".into(),
        }
    }
}

/// Application configuration.
///
/// The credential authority is a constructor parameter; everything else has a default.
/// Use [`from_env()`](TaskdeckConfig::from_env) for convention-based setup,
/// or [`new()`](TaskdeckConfig::new) with `with_*` methods for full control.
pub struct TaskdeckConfig {
    pub(super) authority: CredentialAuthority,
    pub(super) settings: Settings,
}

impl TaskdeckConfig {
    #[must_use]
    pub fn new(authority: CredentialAuthority) -> Self {
        Self {
            authority,
            settings: Settings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `TOKEN_SECRET_KEY`: hex-encoded 64-byte Ed25519 secret key. Without it an ephemeral
    ///   key is generated and every credential dies on restart.
    /// - `TOKEN_TTL_HOURS`: credential lifetime in hours (default 24)
    /// - `COOKIE_KEY`: cookie encryption key bytes (at least 64)
    /// - `SESSION_COOKIE_NAME`: session cookie name
    /// - `DEV_MODE`: `"1"` or `"true"` disables the `Secure` cookie attribute
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if any variable is set but invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        let ttl = match std::env::var("TOKEN_TTL_HOURS") {
            Ok(hours) => {
                let hours: i64 = hours
                    .trim()
                    .parse()
                    .map_err(|e| AuthError::Config(format!("TOKEN_TTL_HOURS: {e}")))?;
                if hours <= 0 {
                    return Err(AuthError::Config("TOKEN_TTL_HOURS must be positive".into()));
                }
                Duration::hours(hours)
            }
            Err(_) => DEFAULT_TTL,
        };

        let authority = match std::env::var("TOKEN_SECRET_KEY") {
            Ok(key_hex) => CredentialAuthority::from_secret_key_hex(&key_hex, ttl)
                .map_err(|e| AuthError::Config(format!("TOKEN_SECRET_KEY: {e}")))?,
            Err(_) => {
                tracing::warn!("TOKEN_SECRET_KEY not set, using an ephemeral signing key");
                CredentialAuthority::generate(ttl)
                    .map_err(|e| AuthError::Config(e.to_string()))?
            }
        };

        let dev_mode = matches!(std::env::var("DEV_MODE").as_deref(), Ok("1") | Ok("true"));

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => Key::generate(),
        };

        let mut config = Self::new(authority)
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!dev_mode);

        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            config = config.with_session_cookie_name(name);
        }

        Ok(config)
    }

    #[must_use]
    pub fn authority(&self) -> &CredentialAuthority {
        &self.authority
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.settings.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_register_path(mut self, path: impl Into<String>) -> Self {
        self.settings.register_path = path.into();
        self
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.settings.landing_path = path.into();
        self
    }
}
