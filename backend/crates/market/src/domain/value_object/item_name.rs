//! Item Name Value Object

use kernel::error::app_error::{AppError, AppResult};

pub const ITEM_NAME_MIN_LENGTH: usize = 3;
pub const ITEM_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemName(String);

impl ItemName {
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into().trim().to_string();
        let len = name.chars().count();

        if len < ITEM_NAME_MIN_LENGTH {
            return Err(AppError::bad_request(format!(
                "Item name must be at least {} characters",
                ITEM_NAME_MIN_LENGTH
            )));
        }
        if len > ITEM_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Item name must be at most {} characters",
                ITEM_NAME_MAX_LENGTH
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AppError::bad_request("Item name contains invalid characters"));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_name_rules() {
        assert!(ItemName::new("Lawn mower").is_ok());
        assert!(ItemName::new(" ab ").is_err());
        assert!(ItemName::new("x".repeat(101)).is_err());
    }
}
