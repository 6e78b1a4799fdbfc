//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entity::session::SessionUser;
use crate::domain::value_object::{
    display_name::DisplayName, email::Email, person_name::PersonName,
    user_password::UserPassword,
};

/// Registered marketplace user
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique public handle
    pub display_name: DisplayName,
    pub first_name: PersonName,
    pub last_name: PersonName,
    /// Unique, lower-cased
    pub email: Email,
    /// Argon2id hash, never serialized outward
    pub password: UserPassword,
    /// False until the confirmation key is redeemed
    pub active: bool,
    pub avatar: Option<String>,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New, inactive user
    pub fn new(
        display_name: DisplayName,
        first_name: PersonName,
        last_name: PersonName,
        email: Email,
        password: UserPassword,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            display_name,
            first_name,
            last_name,
            email,
            password,
            active: false,
            avatar: None,
            rating: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attribute snapshot cached with a session
    pub fn snapshot(&self) -> SessionUser {
        SessionUser {
            user_id: self.user_id,
            first_name: self.first_name.as_str().to_string(),
            last_name: self.last_name.as_str().to_string(),
            display_name: self.display_name.as_str().to_string(),
            active: self.active,
            avatar: self.avatar.clone(),
            email: Some(self.email.as_str().to_string()),
        }
    }

    /// Apply allow-listed profile changes
    pub fn apply(&mut self, changes: &ProfileChanges) {
        if let Some(first_name) = &changes.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            self.last_name = last_name.clone();
        }
        if let Some(avatar) = &changes.avatar {
            self.avatar = Some(avatar.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// Fields a user may change on their own profile. Anything else
/// (email, display name, activation, rating) is not updatable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub avatar: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.avatar.is_none()
    }
}
