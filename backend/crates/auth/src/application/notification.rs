//! Account mails

use askama::Template;
use platform::mail::{Mail, MailError};

use crate::domain::entity::user::User;

#[derive(Template)]
#[template(path = "mail/welcome.html")]
struct WelcomeBody<'a> {
    first_name: &'a str,
    last_name: &'a str,
    display_name: &'a str,
    confirmation_link: &'a str,
}

#[derive(Template)]
#[template(path = "mail/password_reset.html")]
struct PasswordResetBody<'a> {
    first_name: &'a str,
    password: &'a str,
}

pub fn welcome_mail(user: &User, confirmation_link: &str) -> Result<Mail, MailError> {
    Mail::render(
        user.email.as_str(),
        "Welcome to our network",
        &WelcomeBody {
            first_name: user.first_name.as_str(),
            last_name: user.last_name.as_str(),
            display_name: user.display_name.as_str(),
            confirmation_link,
        },
    )
}

pub fn password_reset_mail(user: &User, password: &str) -> Result<Mail, MailError> {
    Mail::render(
        user.email.as_str(),
        "New Password",
        &PasswordResetBody {
            first_name: user.first_name.as_str(),
            password,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::tests::sample_user;
    use crate::domain::value_object::person_name::PersonName;

    #[test]
    fn test_welcome_mail_escapes_user_text() {
        let mut user = sample_user("ada", "ada@example.com");
        user.first_name = PersonName::new("<script>").unwrap();

        let mail = welcome_mail(&user, "http://localhost/api/confirm-email?key=a&b").unwrap();
        assert_eq!(mail.to, "ada@example.com");
        assert_eq!(mail.subject, "Welcome to our network");
        assert!(mail.html.contains("&lt;script&gt;"));
        assert!(mail.html.contains("key=a&amp;b"));
        assert!(!mail.html.contains("<script>"));
    }

    #[test]
    fn test_password_reset_mail_carries_password() {
        let user = sample_user("ada", "ada@example.com");

        let mail = password_reset_mail(&user, "Tmp-4f9a2c").unwrap();
        assert_eq!(mail.subject, "New Password");
        assert!(mail.html.contains("<code>Tmp-4f9a2c</code>"));
    }
}
