//! Field validation
//!
//! Collects one message per invalid request field so a client sees every
//! problem at once instead of the first one only.

use crate::error::app_error::{AppResult, FieldErrors};

#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value of a successful check, record the message of a failed
    /// one. The first message recorded for a field wins.
    pub fn check<T>(&mut self, field: &str, result: AppResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.reject(field, err.message());
                None
            }
        }
    }

    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}
