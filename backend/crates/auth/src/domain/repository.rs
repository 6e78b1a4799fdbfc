//! Repository Traits
//!
//! Interfaces for relational persistence. Implementations live in the
//! infrastructure layer.

use kernel::id::UserId;

use crate::domain::entity::user::{ProfileChanges, User};
use crate::domain::value_object::{
    display_name::DisplayName, email::Email, user_password::UserPassword,
};
use crate::error::AuthResult;

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn find_by_display_name(&self, display_name: &DisplayName) -> AuthResult<Option<User>>;

    /// All users ordered by display name
    async fn list(&self) -> AuthResult<Vec<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    async fn exists_by_display_name(&self, display_name: &DisplayName) -> AuthResult<bool>;

    /// Apply allow-listed changes; `None` if the user does not exist
    async fn update_profile(
        &self,
        user_id: &UserId,
        changes: &ProfileChanges,
    ) -> AuthResult<Option<User>>;

    /// Mark the account confirmed; `None` if the user does not exist
    async fn set_active(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn update_password(&self, user_id: &UserId, password: &UserPassword) -> AuthResult<()>;

    /// Hard delete; `false` if nothing was deleted
    async fn delete(&self, user_id: &UserId) -> AuthResult<bool>;
}

/// Bound for repositories held in shared application state
pub trait SharedUserRepository: UserRepository + Send + Sync + 'static {}

impl<T> SharedUserRepository for T where T: UserRepository + Send + Sync + 'static {}
