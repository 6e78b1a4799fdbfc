//! Forgot Password Use Case
//!
//! Replaces the password with a random temporary one and mails it. The
//! caller learns nothing about whether the email is registered.

use std::sync::Arc;

use platform::mail::{Notifier, SharedMailer};

use crate::application::config::AuthConfig;
use crate::application::notification::password_reset_mail;
use crate::domain::repository::SharedUserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::AuthResult;

pub struct ForgotPasswordUseCase<R, M> {
    users: Arc<R>,
    notifier: Notifier<M>,
    config: Arc<AuthConfig>,
}

impl<R, M> ForgotPasswordUseCase<R, M>
where
    R: SharedUserRepository,
    M: SharedMailer,
{
    pub fn new(users: Arc<R>, notifier: Notifier<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            users,
            notifier,
            config,
        }
    }

    pub async fn execute(&self, email: String) -> AuthResult<()> {
        let Ok(email) = Email::new(email) else {
            return Ok(());
        };
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let temporary = RawPassword::generate();
        let hashed = UserPassword::from_raw(&temporary, self.config.pepper())?;
        self.users.update_password(&user.user_id, &hashed).await?;

        match password_reset_mail(&user, temporary.expose()) {
            Ok(mail) => {
                self.notifier.dispatch(mail);
            }
            Err(e) => tracing::warn!(error = %e, user_id = %user.user_id, "Password reset mail not sent"),
        }

        tracing::info!(user_id = %user.user_id, "Password reset");

        Ok(())
    }
}
