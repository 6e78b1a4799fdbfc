//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::crypto;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens (at least 32 bytes)
    pub signing_key: Vec<u8>,
    /// Token lifetime (`exp` claim)
    pub token_ttl: Duration,
    /// Session cache lifetime, independent of the token lifetime
    pub session_ttl: Duration,
    /// Lifetime of an unredeemed confirmation key
    pub confirmation_ttl: Duration,
    /// Public base URL used in confirmation links
    pub base_url: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: Vec::new(),
            token_ttl: Duration::from_secs(72 * 3600),
            session_ttl: Duration::from_secs(36 * 3600),
            confirmation_ttl: Duration::from_secs(7 * 24 * 3600),
            base_url: "http://localhost:31113".to_string(),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Config with a random signing key (tokens die with the process)
    pub fn with_random_secret() -> Self {
        Self {
            signing_key: crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn confirmation_link(&self, key: &str) -> String {
        format!(
            "{}/api/confirm-email?key={}",
            self.base_url.trim_end_matches('/'),
            key
        )
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("session_ttl", &self.session_ttl)
            .field("confirmation_ttl", &self.confirmation_ttl)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
