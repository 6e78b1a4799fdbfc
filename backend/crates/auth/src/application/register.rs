//! Register Use Case
//!
//! Creates an inactive account, mails a confirmation link and opens a first
//! session.

use std::sync::Arc;

use kernel::validation::Validator;
use platform::kv::SharedKv;
use platform::mail::{Notifier, SharedMailer};

use crate::application::config::AuthConfig;
use crate::application::notification::welcome_mail;
use crate::application::token::{IssuedSession, TokenIssuer, open_session};
use crate::domain::entity::user::User;
use crate::domain::repository::SharedUserRepository;
use crate::domain::value_object::{
    display_name::DisplayName,
    email::Email,
    person_name::PersonName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};
use crate::infra::confirmation::ConfirmationKeys;
use crate::infra::session_cache::SessionCache;

pub struct RegisterInput {
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<R, K, M> {
    users: Arc<R>,
    sessions: SessionCache<K>,
    confirmations: ConfirmationKeys<K>,
    issuer: Arc<TokenIssuer>,
    notifier: Notifier<M>,
    config: Arc<AuthConfig>,
}

impl<R, K, M> RegisterUseCase<R, K, M>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    pub fn new(
        users: Arc<R>,
        sessions: SessionCache<K>,
        confirmations: ConfirmationKeys<K>,
        issuer: Arc<TokenIssuer>,
        notifier: Notifier<M>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            users,
            sessions,
            confirmations,
            issuer,
            notifier,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<IssuedSession> {
        let mut v = Validator::new();
        let display_name = v.check("display_name", DisplayName::new(input.display_name));
        let first_name = v.check("first_name", PersonName::new(input.first_name));
        let last_name = v.check("last_name", PersonName::new(input.last_name));
        let email = v.check("email", Email::new(input.email));
        let password = v.check("password", RawPassword::new(input.password));

        if let Some(email) = &email {
            if self.users.exists_by_email(email).await? {
                v.reject("email", "Sorry email is already taken");
            }
        }
        if let Some(display_name) = &display_name {
            if self.users.exists_by_display_name(display_name).await? {
                v.reject("display_name", "Sorry display name is already taken");
            }
        }

        let (Some(display_name), Some(first_name), Some(last_name), Some(email), Some(password)) =
            (display_name, first_name, last_name, email, password)
        else {
            return Err(AuthError::Validation(v.into_errors()));
        };
        if v.has_errors() {
            return Err(AuthError::Validation(v.into_errors()));
        }

        let hashed = UserPassword::from_raw(&password, self.config.pepper())?;
        let user = User::new(display_name, first_name, last_name, email, hashed);
        self.users.create(&user).await?;

        let key = match self.confirmations.issue(&user.user_id).await {
            Ok(key) => key,
            Err(e) => {
                // Without a key the account could never be activated.
                if let Err(cleanup) = self.users.delete(&user.user_id).await {
                    tracing::error!(error = %cleanup, user_id = %user.user_id, "Failed to remove unconfirmable user");
                }
                return Err(e);
            }
        };

        match welcome_mail(&user, &self.config.confirmation_link(&key)) {
            Ok(mail) => {
                self.notifier.dispatch(mail);
            }
            Err(e) => tracing::warn!(error = %e, user_id = %user.user_id, "Welcome mail not sent"),
        }

        let issued = open_session(&self.issuer, &self.sessions, &user.snapshot()).await?;

        tracing::info!(
            user_id = %user.user_id,
            display_name = %user.display_name,
            "User registered"
        );

        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::Fixture;
    use crate::domain::repository::UserRepository;

    fn input(display_name: &str, email: &str) -> RegisterInput {
        RegisterInput {
            display_name: display_name.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: "password1".into(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_inactive_user_with_session() {
        let fx = Fixture::new();
        let issued = fx.register().execute(input("ada", "Ada@Example.com")).await.unwrap();

        let ctx = fx.gate().authenticate(Some(&format!("Bearer {}", issued.token))).await.unwrap();
        assert!(!ctx.user.active);
        assert_eq!(ctx.user.display_name, "ada");

        let user = fx
            .users
            .find_by_email(&Email::new("ada@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(!user.active);
    }

    #[tokio::test]
    async fn test_register_mails_confirmation_link() {
        let fx = Fixture::new();
        fx.register().execute(input("ada", "ada@example.com")).await.unwrap();
        fx.settle().await;

        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Welcome to our network");
        assert!(sent[0].html.contains("confirm-email?key="));
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let fx = Fixture::new();
        let err = fx
            .register()
            .execute(RegisterInput {
                display_name: "a".into(),
                first_name: "".into(),
                last_name: "Lovelace".into(),
                email: "nope".into(),
                password: "short".into(),
            })
            .await
            .unwrap_err();

        let AuthError::Validation(fields) = err else {
            panic!("expected validation error, got {err:?}");
        };
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["display_name", "email", "first_name", "password"]);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email_and_name() {
        let fx = Fixture::new();
        fx.register().execute(input("ada", "ada@example.com")).await.unwrap();

        let err = fx.register().execute(input("ada", "ADA@example.com")).await.unwrap_err();
        let AuthError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("display_name"));
    }

    #[tokio::test]
    async fn test_user_removed_when_key_cannot_be_stored() {
        let fx = Fixture::new();
        fx.kv.fail_after(0);

        let err = fx.register().execute(input("ada", "ada@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
        assert!(fx.users.list().await.unwrap().is_empty());
    }
}
