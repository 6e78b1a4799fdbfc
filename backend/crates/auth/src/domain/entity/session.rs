//! Session snapshot and request context

use std::collections::HashMap;

use kernel::id::UserId;
use serde::Serialize;

use crate::domain::value_object::session_id::SessionId;
use crate::error::{AuthError, AuthResult};

pub const FIELD_FIRST_NAME: &str = "FirstName";
pub const FIELD_LAST_NAME: &str = "LastName";
pub const FIELD_DISPLAY_NAME: &str = "DisplayName";
pub const FIELD_ACTIVE: &str = "Active";
pub const FIELD_AVATAR: &str = "Avatar";
pub const FIELD_USER_ID: &str = "userID";
pub const FIELD_EMAIL: &str = "email";

/// User attributes cached with a session, valid as of the last write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub active: bool,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

impl SessionUser {
    /// Hash fields as stored in the session record
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            (FIELD_FIRST_NAME.to_string(), self.first_name.clone()),
            (FIELD_LAST_NAME.to_string(), self.last_name.clone()),
            (FIELD_DISPLAY_NAME.to_string(), self.display_name.clone()),
            (FIELD_ACTIVE.to_string(), self.active.to_string()),
            (FIELD_AVATAR.to_string(), self.avatar.clone().unwrap_or_default()),
            (FIELD_USER_ID.to_string(), self.user_id.to_string()),
        ];
        if let Some(email) = &self.email {
            fields.push((FIELD_EMAIL.to_string(), email.clone()));
        }
        fields
    }

    /// Rebuild from a session record. `None` when the record is unusable.
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let user_id = fields.get(FIELD_USER_ID)?.parse().ok()?;
        let text = |name: &str| fields.get(name).cloned().unwrap_or_default();

        Some(Self {
            user_id,
            first_name: text(FIELD_FIRST_NAME),
            last_name: text(FIELD_LAST_NAME),
            display_name: fields.get(FIELD_DISPLAY_NAME)?.clone(),
            active: fields.get(FIELD_ACTIVE).is_some_and(|v| v == "true"),
            avatar: fields.get(FIELD_AVATAR).filter(|v| !v.is_empty()).cloned(),
            email: fields.get(FIELD_EMAIL).filter(|v| !v.is_empty()).cloned(),
        })
    }
}

/// Resolved identity of an authenticated request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session_id: SessionId,
    pub user: SessionUser,
}

impl AuthContext {
    /// Marketplace mutations are reserved for confirmed accounts.
    pub fn require_active(&self) -> AuthResult<&SessionUser> {
        if self.user.active {
            Ok(&self.user)
        } else {
            Err(AuthError::AccountInactive)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(active: bool) -> SessionUser {
        SessionUser {
            user_id: UserId::new(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            display_name: "ada".into(),
            active,
            avatar: None,
            email: Some("a@x.com".into()),
        }
    }

    #[test]
    fn test_fields_roundtrip() {
        let user = snapshot(true);
        let map: HashMap<String, String> = user.to_fields().into_iter().collect();
        assert_eq!(map[FIELD_ACTIVE], "true");
        assert_eq!(map[FIELD_AVATAR], "");
        assert_eq!(SessionUser::from_fields(&map), Some(user));
    }

    #[test]
    fn test_record_without_user_id_is_unusable() {
        let mut map: HashMap<String, String> = snapshot(true).to_fields().into_iter().collect();
        map.remove(FIELD_USER_ID);
        assert_eq!(SessionUser::from_fields(&map), None);
    }

    #[test]
    fn test_require_active() {
        let ctx = AuthContext {
            session_id: SessionId::generate(),
            user: snapshot(false),
        };
        assert!(matches!(ctx.require_active(), Err(AuthError::AccountInactive)));
    }
}
