//! Login Use Case
//!
//! Exchanges credentials for a new session. The account's `active` flag is
//! not checked here; inactive users get a session whose snapshot says so.

use std::sync::Arc;

use platform::kv::SharedKv;

use crate::application::config::AuthConfig;
use crate::application::token::{IssuedSession, TokenIssuer, open_session};
use crate::domain::repository::SharedUserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};
use crate::infra::session_cache::SessionCache;

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<R, K> {
    users: Arc<R>,
    sessions: SessionCache<K>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<R, K> LoginUseCase<R, K>
where
    R: SharedUserRepository,
    K: SharedKv,
{
    pub fn new(
        users: Arc<R>,
        sessions: SessionCache<K>,
        issuer: Arc<TokenIssuer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            users,
            sessions,
            issuer,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<IssuedSession> {
        // Unknown email, malformed email and wrong password look the same.
        let email = Email::new(input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let password = RawPassword::for_login(input.password);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.password.verify(&password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        let issued = open_session(&self.issuer, &self.sessions, &user.snapshot()).await?;

        tracing::info!(user_id = %user.user_id, active = user.active, "User logged in");

        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::Fixture;

    fn input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_inactive_user_can_log_in() {
        let fx = Fixture::new();
        fx.seed_user("ada", "ada@example.com", false).await;

        let issued = fx.login().execute(input("ADA@example.com", "password1")).await.unwrap();
        let ctx = fx.gate().authenticate(Some(&format!("Bearer {}", issued.token))).await.unwrap();
        assert!(!ctx.user.active);
    }

    #[tokio::test]
    async fn test_each_login_opens_its_own_session() {
        let fx = Fixture::new();
        fx.seed_user("ada", "ada@example.com", true).await;

        let first = fx.login().execute(input("ada@example.com", "password1")).await.unwrap();
        let second = fx.login().execute(input("ada@example.com", "password1")).await.unwrap();
        assert_ne!(first.session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_bad_credentials_share_one_error() {
        let fx = Fixture::new();
        fx.seed_user("ada", "ada@example.com", true).await;

        for (email, password) in [
            ("ada@example.com", "wrong-password"),
            ("bob@example.com", "password1"),
            ("not-an-email", "password1"),
        ] {
            let err = fx.login().execute(input(email, password)).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials), "{email}");
        }
    }
}
