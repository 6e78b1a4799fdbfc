//! User Password Value Object
//!
//! Domain wrapper over `platform::password`: [`RawPassword`] is what a user
//! typed, [`UserPassword`] is the stored Argon2id hash.

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Password from user input. Zeroized when dropped.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a newly chosen password
    pub fn new(raw: String) -> AppResult<Self> {
        ClearTextPassword::new(raw).map(Self).map_err(|e| match e {
            PasswordPolicyError::TooShort { .. } | PasswordPolicyError::TooLong { .. } => {
                AppError::bad_request(e.to_string())
            }
            PasswordPolicyError::EmptyOrWhitespace => AppError::bad_request("Please supply a password"),
            PasswordPolicyError::InvalidCharacter => {
                AppError::bad_request("Password contains invalid characters")
            }
        })
    }

    /// Wrap a password typed at login without applying the policy
    pub fn for_login(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }

    /// Random temporary password for the forgot-password flow
    pub fn generate() -> Self {
        Self(ClearTextPassword::generate())
    }

    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Hashed password, the only form that is stored
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        raw.0
            .hash(pepper)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    pub fn from_db(phc: impl Into<String>) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&raw.0, pepper)
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserPassword").field(&"[HASH]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_messages() {
        let err = RawPassword::new("short".into()).unwrap_err();
        assert!(err.message().contains("at least 8"));
    }

    #[test]
    fn test_hash_verify_roundtrip_through_db_form() {
        let raw = RawPassword::new("password1".into()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();
        let restored = UserPassword::from_db(hashed.as_phc_string()).unwrap();

        assert!(restored.verify(&RawPassword::for_login("password1".into()), None));
        assert!(!restored.verify(&RawPassword::for_login("password2".into()), None));
    }
}
