//! Display Name Value Object
//!
//! Public handle shown on items, comments and bids. Unique per user.

use kernel::error::app_error::{AppError, AppResult};
use serde::Serialize;

pub const DISPLAY_NAME_MIN_LENGTH: usize = 3;
pub const DISPLAY_NAME_MAX_LENGTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// Letters, digits, `_`, `-` and `.`; 3 to 30 characters
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into().trim().to_string();
        let len = name.chars().count();

        if len < DISPLAY_NAME_MIN_LENGTH || len > DISPLAY_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Display name must be between {} and {} characters",
                DISPLAY_NAME_MIN_LENGTH, DISPLAY_NAME_MAX_LENGTH
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(AppError::bad_request(
                "Display name may only contain letters, digits, '_', '-' and '.'",
            ));
        }

        Ok(Self(name))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_rules() {
        assert!(DisplayName::new("ada_l").is_ok());
        assert!(DisplayName::new("ab").is_err());
        assert!(DisplayName::new("a".repeat(31)).is_err());
        assert!(DisplayName::new("ada lovelace").is_err());
        assert!(DisplayName::new("<script>").is_err());
    }

    #[test]
    fn test_display_name_is_trimmed() {
        assert_eq!(DisplayName::new("  ada  ").unwrap().as_str(), "ada");
    }
}
