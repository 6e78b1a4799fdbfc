//! Check Session Use Case
//!
//! The Auth Gate: resolves an `Authorization` header into an
//! [`AuthContext`]. Token validity alone is not enough; the session it names
//! must still be cached.

use std::sync::Arc;

use platform::kv::SharedKv;

use crate::application::token::TokenIssuer;
use crate::domain::entity::session::AuthContext;
use crate::domain::value_object::session_id::SessionId;
use crate::error::{AuthError, AuthResult};
use crate::infra::session_cache::SessionCache;

const BEARER_PREFIX: &str = "Bearer ";

pub struct AuthGate<K> {
    issuer: Arc<TokenIssuer>,
    sessions: SessionCache<K>,
}

impl<K: Clone> Clone for AuthGate<K> {
    fn clone(&self) -> Self {
        Self {
            issuer: self.issuer.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<K: SharedKv> AuthGate<K> {
    pub fn new(issuer: Arc<TokenIssuer>, sessions: SessionCache<K>) -> Self {
        Self { issuer, sessions }
    }

    /// Check the raw `Authorization` header value
    pub async fn authenticate(&self, authorization: Option<&str>) -> AuthResult<AuthContext> {
        let header = authorization.ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidToken)?;

        let claims = self.issuer.verify(token)?;
        let session_id = SessionId::parse(&claims.session_id).ok_or(AuthError::InvalidToken)?;
        let user = self.sessions.get(&session_id).await?;

        Ok(AuthContext { session_id, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use kernel::id::UserId;
    use platform::kv::MemoryKv;

    use crate::application::token::open_session;
    use crate::domain::entity::session::SessionUser;
    use crate::infra::session_cache::SESSION_TTL;

    fn gate(kv: &MemoryKv) -> (AuthGate<MemoryKv>, Arc<TokenIssuer>) {
        let issuer = Arc::new(TokenIssuer::new(
            b"0123456789abcdef0123456789abcdef",
            Duration::from_secs(72 * 3600),
        ));
        let sessions = SessionCache::new(kv.clone(), SESSION_TTL);
        (AuthGate::new(issuer.clone(), sessions), issuer)
    }

    fn user() -> SessionUser {
        SessionUser {
            user_id: UserId::new(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            display_name: "ada".into(),
            active: true,
            avatar: None,
            email: Some("a@x.com".into()),
        }
    }

    #[tokio::test]
    async fn test_valid_token_with_cached_session() {
        let kv = MemoryKv::new();
        let (gate, issuer) = gate(&kv);
        let user = user();
        let issued = open_session(&issuer, &SessionCache::new(kv.clone(), SESSION_TTL), &user)
            .await
            .unwrap();

        let ctx = gate
            .authenticate(Some(&format!("Bearer {}", issued.token)))
            .await
            .unwrap();
        assert_eq!(ctx.user, user);
        assert_eq!(ctx.session_id, issued.session_id);
    }

    #[tokio::test]
    async fn test_header_shapes() {
        let kv = MemoryKv::new();
        let (gate, issuer) = gate(&kv);
        let token = issuer.issue().unwrap().token;

        assert!(matches!(gate.authenticate(None).await, Err(AuthError::MissingToken)));
        assert!(matches!(
            gate.authenticate(Some(&format!("Token {token}"))).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            gate.authenticate(Some("Bearer ")).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_valid_token_without_session() {
        let kv = MemoryKv::new();
        let (gate, issuer) = gate(&kv);
        let token = issuer.issue().unwrap().token;

        assert!(matches!(
            gate.authenticate(Some(&format!("Bearer {token}"))).await,
            Err(AuthError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_token_outlives_session() {
        let kv = MemoryKv::new();
        let (gate, issuer) = gate(&kv);
        let issued = open_session(&issuer, &SessionCache::new(kv.clone(), SESSION_TTL), &user())
            .await
            .unwrap();

        kv.advance_clock(SESSION_TTL);
        assert!(matches!(
            gate.authenticate(Some(&format!("Bearer {}", issued.token))).await,
            Err(AuthError::SessionExpired)
        ));
    }
}
