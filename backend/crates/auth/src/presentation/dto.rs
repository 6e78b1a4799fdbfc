//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

use crate::application::{RegisterInput, UpdateProfileInput};
use crate::domain::entity::user::User;

// ============================================================================
// Register / Login
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        Self {
            display_name: req.display_name,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token for the `Authorization` header
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Confirmation / Password reset
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmEmailQuery {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

// ============================================================================
// Profile
// ============================================================================

/// Only these keys are accepted; anything else is a 400.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfileInput {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            avatar: req.avatar,
        }
    }
}

/// Public view of a user; credentials and email stay private
#[derive(Debug, Clone, Serialize)]
pub struct UserProfileResponse {
    pub user_id: UserId,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub rating: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            display_name: user.display_name.as_str().to_string(),
            first_name: user.first_name.as_str().to_string(),
            last_name: user.last_name.as_str().to_string(),
            avatar: user.avatar,
            rating: user.rating,
            active: user.active,
            created_at: user.created_at,
        }
    }
}
