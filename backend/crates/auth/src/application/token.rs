//! Token Issuer
//!
//! Mints a session identifier plus an HS256 JWT carrying
//! `{"sessionID", "exp"}`. Verification is stateless; the Auth Gate still
//! requires the session to be cached.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use platform::kv::SharedKv;
use serde::{Deserialize, Serialize};

use crate::domain::entity::session::SessionUser;
use crate::domain::value_object::session_id::SessionId;
use crate::error::{AuthError, AuthResult};
use crate::infra::session_cache::SessionCache;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub exp: u64,
}

/// A freshly minted session identifier and its bearer token
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: SessionId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        // HS256 only: tokens declaring any other algorithm are rejected.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// No side effects: caching the session is the caller's job.
    pub fn issue(&self) -> AuthResult<IssuedSession> {
        let session_id = SessionId::generate();
        let expires_at = Utc::now() + chrono::Duration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            session_id: session_id.as_str().to_string(),
            exp: expires_at.timestamp() as u64,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        Ok(IssuedSession {
            session_id,
            token,
            expires_at,
        })
    }

    /// Check signature, algorithm and expiry
    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Issue a token and cache the user's snapshot under its session id
pub async fn open_session<K: SharedKv>(
    issuer: &TokenIssuer,
    sessions: &SessionCache<K>,
    user: &SessionUser,
) -> AuthResult<IssuedSession> {
    let issued = issuer.issue()?;
    sessions.put(&issued.session_id, user).await?;
    Ok(issued)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, Duration::from_secs(72 * 3600))
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = issuer();
        let issued = issuer.issue().unwrap();
        let claims = issuer.verify(&issued.token).unwrap();

        assert_eq!(claims.session_id, issued.session_id.as_str());
        assert_eq!(claims.exp, issued.expires_at.timestamp() as u64);
    }

    #[test]
    fn test_claim_name_on_the_wire() {
        let claims = SessionClaims {
            session_id: "abc".into(),
            exp: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sessionID"], "abc");
    }

    #[test]
    fn test_bad_signature_is_invalid() {
        let other = TokenIssuer::new(b"another-secret-another-secret-00", Duration::from_secs(60));
        let token = other.issue().unwrap().token;
        assert!(matches!(issuer().verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let claims = SessionClaims {
            session_id: SessionId::generate().as_str().to_string(),
            exp: (Utc::now().timestamp() - 10) as u64,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(issuer().verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let claims = SessionClaims {
            session_id: SessionId::generate().as_str().to_string(),
            exp: (Utc::now().timestamp() + 600) as u64,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(issuer().verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(issuer().verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }
}
