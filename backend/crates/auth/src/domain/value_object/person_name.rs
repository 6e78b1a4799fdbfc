//! First / last name

use kernel::error::app_error::{AppError, AppResult};
use serde::Serialize;

pub const PERSON_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PersonName(String);

impl PersonName {
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(AppError::bad_request("Please supply a name"));
        }
        if name.chars().count() > PERSON_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Name must be at most {} characters",
                PERSON_NAME_MAX_LENGTH
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AppError::bad_request("Name contains invalid characters"));
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
