//! Free text posted by users: comment and reply bodies, bid messages and
//! item instructions.

use kernel::error::app_error::{AppError, AppResult};

pub const MESSAGE_MAX_LENGTH: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    /// Non-empty after trimming
    pub fn new(text: impl Into<String>) -> AppResult<Self> {
        let text = Self::optional(text)?;
        if text.0.is_empty() {
            return Err(AppError::bad_request("Please supply a message"));
        }
        Ok(text)
    }

    /// May be empty, e.g. item instructions
    pub fn optional(text: impl Into<String>) -> AppResult<Self> {
        let text = text.into().trim().to_string();
        if text.chars().count() > MESSAGE_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Text must be at most {} characters",
                MESSAGE_MAX_LENGTH
            )));
        }
        Ok(Self(text))
    }

    pub fn from_db(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_rules() {
        assert!(MessageText::new("   ").is_err());
        assert_eq!(MessageText::optional("  ").unwrap().as_str(), "");
        assert!(MessageText::new("x".repeat(MESSAGE_MAX_LENGTH + 1)).is_err());
        assert_eq!(MessageText::new(" hi ").unwrap().as_str(), "hi");
    }
}
