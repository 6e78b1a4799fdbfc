//! Auth Middleware
//!
//! Runs the Auth Gate in front of protected routes and hands the resolved
//! [`AuthContext`] to handlers through request extensions.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use platform::kv::SharedKv;

use crate::application::AuthGate;
use crate::domain::entity::session::AuthContext;
use crate::error::AuthError;

/// Session id of the authenticated caller, for downstream layers and logs
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Middleware that requires a valid bearer token and a live session
pub async fn require_auth<K: SharedKv>(
    State(gate): State<AuthGate<K>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::InvalidToken))
        .transpose()?;

    let ctx = gate.authenticate(authorization).await?;

    if let Ok(value) = HeaderValue::from_str(ctx.session_id.as_str()) {
        req.headers_mut().insert(SESSION_ID_HEADER, value);
    }
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Handlers behind [`require_auth`] take the context as an argument.
impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
