//! Phone Number Value Object
//!
//! Contact number shown on a listing. Digits with optional `+`, spaces,
//! dashes and parentheses; at least six digits.

use kernel::error::app_error::{AppError, AppResult};

const PHONE_MIN_DIGITS: usize = 6;
const PHONE_MAX_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNo(String);

impl PhoneNo {
    pub fn new(phone: impl Into<String>) -> AppResult<Self> {
        let phone = phone.into().trim().to_string();
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        let allowed = phone
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')') || (c == '+' && i == 0));

        if digits < PHONE_MIN_DIGITS || phone.len() > PHONE_MAX_LENGTH || !allowed {
            return Err(AppError::bad_request("Please supply a valid phone number"));
        }

        Ok(Self(phone))
    }

    pub fn from_db(phone: impl Into<String>) -> Self {
        Self(phone.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_rules() {
        assert!(PhoneNo::new("+234 803 000 0000").is_ok());
        assert!(PhoneNo::new("(01) 555-1234").is_ok());
        assert!(PhoneNo::new("12345").is_err());
        assert!(PhoneNo::new("080-CALL-NOW").is_err());
        assert!(PhoneNo::new("0803+0000000").is_err());
    }
}
