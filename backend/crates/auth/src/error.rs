//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::{AppError, FieldErrors};
use kernel::error::kind::ErrorKind;
use kernel::validation::Validator;
use platform::kv::KvError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

const INTERNAL_MESSAGE: &str = "Sorry there was an internal server error";

#[derive(Debug, Error)]
pub enum AuthError {
    /// One message per invalid request field
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No `Authorization: Bearer` header on a protected route
    #[error("Please supply a token")]
    MissingToken,

    /// Bad signature, wrong algorithm or malformed token
    #[error("Sorry token is invalid")]
    InvalidToken,

    #[error("Sorry token has expired")]
    TokenExpired,

    /// Token verified but its session is no longer cached
    #[error("Sorry session has expired")]
    SessionExpired,

    #[error("Sorry your account isn't activated yet")]
    AccountInactive,

    #[error("Sorry user not found")]
    UserNotFound,

    /// Unknown, expired or already redeemed confirmation key
    #[error("Sorry confirmation key is invalid or has expired")]
    ConfirmationKeyInvalid,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Key-value store error: {0}")]
    Store(#[from] KvError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Field rejection for a unique value another account already holds
    pub fn taken(field: &str) -> Self {
        let mut v = Validator::new();
        v.reject(field, format!("Sorry {} is already taken", field.replace('_', " ")));
        AuthError::Validation(v.into_errors())
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::InvalidCredentials => ErrorKind::BadRequest,
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::SessionExpired => ErrorKind::Unauthorized,
            AuthError::AccountInactive => ErrorKind::Forbidden,
            AuthError::UserNotFound | AuthError::ConfirmationKeyInvalid => ErrorKind::NotFound,
            AuthError::Database(_) | AuthError::Store(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError. Server-side details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Validation(fields) => AppError::validation(fields.clone()),
            _ if self.kind().is_server_error() => AppError::new(self.kind(), INTERNAL_MESSAGE),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Auth key-value store error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidToken => {
                tracing::warn!("Rejected invalid bearer token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::SessionExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::AccountInactive.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::ConfirmationKeyInvalid.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::Store(KvError::Unavailable).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_taken_names_the_field() {
        let AuthError::Validation(fields) = AuthError::taken("display_name") else {
            panic!("expected validation error");
        };
        assert_eq!(fields["display_name"], "Sorry display name is already taken");
        assert_eq!(AuthError::taken("email").status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AuthError::Internal("signing key rejected by backend".into());
        let app = err.to_app_error();
        assert_eq!(app.message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_token_and_session_failures_have_distinct_messages() {
        let token = AuthError::InvalidToken.to_app_error();
        let session = AuthError::SessionExpired.to_app_error();
        assert_eq!(token.status_code(), session.status_code());
        assert_ne!(token.message(), session.message());
    }
}
