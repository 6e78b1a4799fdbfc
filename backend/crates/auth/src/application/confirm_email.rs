//! Confirm Email Use Case
//!
//! Redeems a confirmation key, activates the account and answers with a
//! fresh session whose snapshot is active.

use std::sync::Arc;

use platform::kv::SharedKv;

use crate::application::token::{IssuedSession, TokenIssuer, open_session};
use crate::domain::repository::SharedUserRepository;
use crate::error::{AuthError, AuthResult};
use crate::infra::confirmation::ConfirmationKeys;
use crate::infra::session_cache::SessionCache;

pub struct ConfirmEmailUseCase<R, K> {
    users: Arc<R>,
    sessions: SessionCache<K>,
    confirmations: ConfirmationKeys<K>,
    issuer: Arc<TokenIssuer>,
}

impl<R, K> ConfirmEmailUseCase<R, K>
where
    R: SharedUserRepository,
    K: SharedKv,
{
    pub fn new(
        users: Arc<R>,
        sessions: SessionCache<K>,
        confirmations: ConfirmationKeys<K>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            users,
            sessions,
            confirmations,
            issuer,
        }
    }

    pub async fn execute(&self, key: &str) -> AuthResult<IssuedSession> {
        if key.is_empty() {
            return Err(AuthError::ConfirmationKeyInvalid);
        }

        let user_id = self
            .confirmations
            .redeem(key)
            .await?
            .ok_or(AuthError::ConfirmationKeyInvalid)?;

        // The key is spent either way; a user deleted in between gets 404.
        let user = self
            .users
            .set_active(&user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let issued = open_session(&self.issuer, &self.sessions, &user.snapshot()).await?;

        tracing::info!(user_id = %user.user_id, "Email confirmed");

        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::Fixture;
    use crate::domain::repository::UserRepository;

    #[tokio::test]
    async fn test_key_activates_exactly_once() {
        let fx = Fixture::new();
        let user = fx.seed_user("ada", "ada@example.com", false).await;
        let key = fx.confirmations().issue(&user.user_id).await.unwrap();

        let issued = fx.confirm().execute(&key).await.unwrap();
        let ctx = fx.gate().authenticate(Some(&format!("Bearer {}", issued.token))).await.unwrap();
        assert!(ctx.user.active);
        assert!(fx.users.find_by_id(&user.user_id).await.unwrap().unwrap().active);

        assert!(matches!(
            fx.confirm().execute(&key).await,
            Err(AuthError::ConfirmationKeyInvalid)
        ));
    }

    #[tokio::test]
    async fn test_unknown_key_never_activates() {
        let fx = Fixture::new();
        let user = fx.seed_user("ada", "ada@example.com", false).await;

        for key in ["", "made-up-key"] {
            assert!(matches!(
                fx.confirm().execute(key).await,
                Err(AuthError::ConfirmationKeyInvalid)
            ));
        }
        assert!(!fx.users.find_by_id(&user.user_id).await.unwrap().unwrap().active);
    }
}
