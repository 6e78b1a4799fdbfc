//! Place Name Value Object
//!
//! City or state of a location, stored upper-cased so lookups and joins do
//! not depend on how a user typed it.

use kernel::error::app_error::{AppError, AppResult};

const PLACE_NAME_MIN_LENGTH: usize = 3;
const PLACE_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceName(String);

impl PlaceName {
    /// `label` names the field in messages, e.g. "city"
    pub fn new(name: impl Into<String>, label: &str) -> AppResult<Self> {
        let name = name.into().trim().to_uppercase();
        let len = name.chars().count();

        if !(PLACE_NAME_MIN_LENGTH..=PLACE_NAME_MAX_LENGTH).contains(&len)
            || name.chars().any(char::is_control)
        {
            return Err(AppError::bad_request(format!("Please supply a valid {label}")));
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
