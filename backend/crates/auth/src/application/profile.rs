//! Profile Use Cases
//!
//! Lookup, listing, self-service update and account deletion.

use std::sync::Arc;

use kernel::validation::Validator;
use platform::kv::SharedKv;

use crate::domain::entity::session::AuthContext;
use crate::domain::entity::user::{ProfileChanges, User};
use crate::domain::repository::SharedUserRepository;
use crate::domain::value_object::{display_name::DisplayName, person_name::PersonName};
use crate::error::{AuthError, AuthResult};
use crate::infra::session_cache::SessionCache;

const AVATAR_MAX_LENGTH: usize = 512;

/// Raw profile update; `None` leaves the field alone
#[derive(Debug, Default)]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
}

pub struct ProfileUseCase<R, K> {
    users: Arc<R>,
    sessions: SessionCache<K>,
}

impl<R, K> ProfileUseCase<R, K>
where
    R: SharedUserRepository,
    K: SharedKv,
{
    pub fn new(users: Arc<R>, sessions: SessionCache<K>) -> Self {
        Self { users, sessions }
    }

    pub async fn get(&self, display_name: &str) -> AuthResult<User> {
        // A name that cannot exist cannot be found.
        let display_name = DisplayName::new(display_name).map_err(|_| AuthError::UserNotFound)?;
        self.users
            .find_by_display_name(&display_name)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn list(&self) -> AuthResult<Vec<User>> {
        self.users.list().await
    }

    /// Apply allow-listed changes and rewrite the caller's session snapshot.
    /// A session revoked while the update ran is not brought back.
    pub async fn update(&self, ctx: &AuthContext, input: UpdateProfileInput) -> AuthResult<User> {
        let changes = validate_changes(input)?;
        if changes.is_empty() {
            let mut v = Validator::new();
            v.reject("profile", "Please supply at least one field to update");
            return Err(AuthError::Validation(v.into_errors()));
        }

        let user = self
            .users
            .update_profile(&ctx.user.user_id, &changes)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.sessions.refresh(&ctx.session_id, &user.snapshot()).await? {
            tracing::debug!(user_id = %user.user_id, "Session ended during profile update");
        }

        tracing::info!(user_id = %user.user_id, "Profile updated");

        Ok(user)
    }

    /// Hard delete of the caller's account and current session
    pub async fn delete(&self, ctx: &AuthContext) -> AuthResult<()> {
        if !self.users.delete(&ctx.user.user_id).await? {
            return Err(AuthError::UserNotFound);
        }
        self.sessions.delete(&ctx.session_id).await?;

        tracing::info!(user_id = %ctx.user.user_id, "Account deleted");

        Ok(())
    }
}

fn validate_changes(input: UpdateProfileInput) -> AuthResult<ProfileChanges> {
    let mut v = Validator::new();
    let first_name = input
        .first_name
        .and_then(|name| v.check("first_name", PersonName::new(name)));
    let last_name = input
        .last_name
        .and_then(|name| v.check("last_name", PersonName::new(name)));
    let avatar = input.avatar.map(|a| a.trim().to_string());
    if avatar
        .as_ref()
        .is_some_and(|a| a.is_empty() || a.len() > AVATAR_MAX_LENGTH)
    {
        v.reject("avatar", "Please supply a valid avatar reference");
    }

    if v.has_errors() {
        return Err(AuthError::Validation(v.into_errors()));
    }
    Ok(ProfileChanges {
        first_name,
        last_name,
        avatar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::Fixture;
    use crate::domain::repository::UserRepository;

    #[tokio::test]
    async fn test_get_and_list() {
        let fx = Fixture::new();
        fx.seed_user("bob", "bob@example.com", true).await;
        fx.seed_user("ada", "ada@example.com", true).await;

        let profiles = fx.profile();
        assert_eq!(profiles.get("bob").await.unwrap().email.as_str(), "bob@example.com");
        assert!(matches!(profiles.get("carol").await, Err(AuthError::UserNotFound)));
        assert!(matches!(profiles.get("!").await, Err(AuthError::UserNotFound)));

        let names: Vec<_> = profiles
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.display_name.as_str().to_string())
            .collect();
        assert_eq!(names, ["ada", "bob"]);
    }

    #[tokio::test]
    async fn test_update_refreshes_session_snapshot() {
        let fx = Fixture::new();
        let (_, ctx) = fx.session_for("ada", "ada@example.com", true).await;

        fx.profile()
            .update(
                &ctx,
                UpdateProfileInput {
                    first_name: Some("Augusta".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let cached = fx.sessions().get(&ctx.session_id).await.unwrap();
        assert_eq!(cached.first_name, "Augusta");
        assert_eq!(cached.last_name, "Lovelace");
    }

    #[tokio::test]
    async fn test_update_after_logout_keeps_session_revoked() {
        let fx = Fixture::new();
        let (_, ctx) = fx.session_for("ada", "ada@example.com", true).await;
        fx.sessions().delete(&ctx.session_id).await.unwrap();

        let user = fx
            .profile()
            .update(
                &ctx,
                UpdateProfileInput {
                    first_name: Some("Augusta".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(user.first_name.as_str(), "Augusta");
        assert!(matches!(
            fx.sessions().get(&ctx.session_id).await,
            Err(AuthError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_and_invalid_changes() {
        let fx = Fixture::new();
        let (_, ctx) = fx.session_for("ada", "ada@example.com", true).await;

        let err = fx.profile().update(&ctx, UpdateProfileInput::default()).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = fx
            .profile()
            .update(
                &ctx,
                UpdateProfileInput {
                    last_name: Some("  ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        let AuthError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("last_name"));
    }

    #[tokio::test]
    async fn test_delete_removes_user_and_session() {
        let fx = Fixture::new();
        let (user, ctx) = fx.session_for("ada", "ada@example.com", true).await;

        fx.profile().delete(&ctx).await.unwrap();

        assert!(fx.users.find_by_id(&user.user_id).await.unwrap().is_none());
        assert!(matches!(
            fx.sessions().get(&ctx.session_id).await,
            Err(AuthError::SessionExpired)
        ));
    }
}
