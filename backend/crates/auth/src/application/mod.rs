//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod confirm_email;
pub mod forgot_password;
pub mod login;
pub mod logout;
pub mod notification;
pub mod profile;
pub mod register;
pub mod token;

// Re-exports
pub use check_session::AuthGate;
pub use config::AuthConfig;
pub use confirm_email::ConfirmEmailUseCase;
pub use forgot_password::ForgotPasswordUseCase;
pub use login::{LoginInput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use profile::{ProfileUseCase, UpdateProfileInput};
pub use register::{RegisterInput, RegisterUseCase};
pub use token::{IssuedSession, SessionClaims, TokenIssuer, open_session};
