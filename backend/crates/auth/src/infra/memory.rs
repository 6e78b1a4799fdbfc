//! In-memory user repository for tests and local runs without PostgreSQL

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use kernel::id::UserId;

use crate::domain::entity::user::{ProfileChanges, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    display_name::DisplayName, email::Email, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<UserId, User>) -> T) -> AuthResult<T> {
        self.users
            .read()
            .map(|users| f(&users))
            .map_err(|_| AuthError::Internal("user store lock poisoned".into()))
    }

    fn write<T>(&self, f: impl FnOnce(&mut HashMap<UserId, User>) -> T) -> AuthResult<T> {
        self.users
            .write()
            .map(|mut users| f(&mut users))
            .map_err(|_| AuthError::Internal("user store lock poisoned".into()))
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let taken = self.read(|users| {
            users.values().find_map(|u| {
                if u.email == user.email {
                    Some("email")
                } else if u.display_name == user.display_name {
                    Some("display_name")
                } else {
                    None
                }
            })
        })?;
        if let Some(field) = taken {
            return Err(AuthError::taken(field));
        }
        self.write(|users| {
            users.insert(user.user_id, user.clone());
        })
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.read(|users| users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.read(|users| users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_display_name(&self, display_name: &DisplayName) -> AuthResult<Option<User>> {
        self.read(|users| {
            users
                .values()
                .find(|u| &u.display_name == display_name)
                .cloned()
        })
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let mut all = self.read(|users| users.values().cloned().collect::<Vec<_>>())?;
        all.sort_by(|a, b| a.display_name.as_str().cmp(b.display_name.as_str()));
        Ok(all)
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        self.read(|users| users.values().any(|u| &u.email == email))
    }

    async fn exists_by_display_name(&self, display_name: &DisplayName) -> AuthResult<bool> {
        self.read(|users| users.values().any(|u| &u.display_name == display_name))
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        changes: &ProfileChanges,
    ) -> AuthResult<Option<User>> {
        self.write(|users| {
            users.get_mut(user_id).map(|user| {
                user.apply(changes);
                user.clone()
            })
        })
    }

    async fn set_active(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.write(|users| {
            users.get_mut(user_id).map(|user| {
                user.active = true;
                user.updated_at = Utc::now();
                user.clone()
            })
        })
    }

    async fn update_password(&self, user_id: &UserId, password: &UserPassword) -> AuthResult<()> {
        self.write(|users| {
            if let Some(user) = users.get_mut(user_id) {
                user.password = password.clone();
                user.updated_at = Utc::now();
            }
        })
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        self.write(|users| users.remove(user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::tests::sample_user;

    #[tokio::test]
    async fn test_duplicate_insert_is_a_field_error() {
        let repo = MemoryUserRepository::default();
        repo.create(&sample_user("ada", "ada@example.com")).await.unwrap();

        let AuthError::Validation(fields) = repo
            .create(&sample_user("augusta", "ada@example.com"))
            .await
            .unwrap_err()
        else {
            panic!("expected validation error");
        };
        assert_eq!(fields["email"], "Sorry email is already taken");

        let AuthError::Validation(fields) = repo
            .create(&sample_user("ada", "other@example.com"))
            .await
            .unwrap_err()
        else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("display_name"));
    }
}
