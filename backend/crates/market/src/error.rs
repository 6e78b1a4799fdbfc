//! Market Error Types
//!
//! Marketplace error variants that integrate with the unified
//! `kernel::error::AppError` system.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::{AppError, FieldErrors};
use kernel::error::kind::ErrorKind;
use platform::kv::KvError;
use thiserror::Error;

/// Market-specific result type alias
pub type MarketResult<T> = Result<T, MarketError>;

const INTERNAL_MESSAGE: &str = "Sorry there was an internal server error";

#[derive(Debug, Error)]
pub enum MarketError {
    /// One message per invalid request field
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Closed listings accept no bids and no edits
    #[error("Sorry item has been closed")]
    ItemClosed,

    #[error("Sorry you're not authorized to view this page")]
    NotOwner,

    #[error("Sorry item not found")]
    ItemNotFound,

    #[error("Sorry location not found")]
    LocationNotFound,

    #[error("Sorry comment not found")]
    CommentNotFound,

    #[error("Sorry reply not found")]
    ReplyNotFound,

    /// Session or activation failure surfaced by the auth crate
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Key-value store error: {0}")]
    Store(#[from] KvError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::Validation(_) | MarketError::ItemClosed => ErrorKind::BadRequest,
            MarketError::NotOwner => ErrorKind::Forbidden,
            MarketError::ItemNotFound
            | MarketError::LocationNotFound
            | MarketError::CommentNotFound
            | MarketError::ReplyNotFound => ErrorKind::NotFound,
            MarketError::Auth(e) => e.kind(),
            MarketError::Database(_) | MarketError::Store(_) | MarketError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError. Server-side details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        match self {
            MarketError::Validation(fields) => AppError::validation(fields.clone()),
            MarketError::Auth(e) => e.to_app_error(),
            _ if self.kind().is_server_error() => AppError::new(self.kind(), INTERNAL_MESSAGE),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            MarketError::Database(e) => {
                tracing::error!(error = %e, "Market database error");
            }
            MarketError::Store(e) => {
                tracing::error!(error = %e, "Market key-value store error");
            }
            MarketError::Internal(msg) => {
                tracing::error!(message = %msg, "Market internal error");
            }
            MarketError::Auth(e) => e.log(),
            MarketError::NotOwner => {
                tracing::warn!("Rejected change by non-owner");
            }
            _ => {
                tracing::debug!(error = %self, "Market error");
            }
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
