//! Error conversions
//!
//! `From` implementations for the backing stores and the axum response
//! rendering of [`AppError`].

use super::app_error::AppError;

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() {
            AppError::bad_request("Request body is not valid JSON").with_source(err)
        } else {
            AppError::internal("Sorry there was an internal server error").with_source(err)
        }
    }
}

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::not_found("Record not found").with_source(err),
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                AppError::service_unavailable("Database unavailable").with_source(err)
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let app_err = match db_err.code().as_deref() {
                    Some("23505") => AppError::conflict("Duplicate key value"),
                    Some("23503") => AppError::bad_request("Referenced record does not exist"),
                    Some("23502") | Some("23514") => AppError::bad_request("Invalid field value"),
                    _ => AppError::internal("Sorry there was an internal server error"),
                };
                app_err.with_source(err)
            }
            _ => AppError::internal("Sorry there was an internal server error").with_source(err),
        }
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

impl AppError {
    /// JSON envelope sent to clients. The source error is never included.
    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": self.message(),
            "status": self.status_code(),
            "kind": self.kind().tag(),
        });
        if let Some(fields) = self.fields() {
            body["fields"] = serde_json::json!(fields);
        }
        if let Some(action) = self.action() {
            body["action"] = serde_json::json!(action);
        }
        body
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::app_error::FieldErrors;
    use crate::error::kind::ErrorKind;

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert_eq!(app_err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_body_shape() {
        let body = AppError::unauthorized("Sorry session has expired").to_body();
        assert_eq!(body["error"], "Sorry session has expired");
        assert_eq!(body["status"], 401);
        assert_eq!(body["kind"], "UNAUTHORIZED");
        assert!(body.get("fields").is_none());
    }

    #[test]
    fn test_body_hides_source() {
        let io_err = std::io::Error::other("connection refused by 10.0.0.7");
        let body = AppError::internal("Sorry there was an internal server error")
            .with_source(io_err)
            .to_body();
        assert!(!body.to_string().contains("10.0.0.7"));
    }

    #[test]
    fn test_body_fields() {
        let mut fields = FieldErrors::new();
        fields.insert("name".into(), "Name must be at least 3 characters".into());
        let body = AppError::validation(fields).to_body();
        assert_eq!(body["fields"]["name"], "Name must be at least 3 characters");
    }
}
