//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Users, session snapshots, repository traits
//! - `application/` - Token issuer, Auth Gate and account use cases
//! - `infra/` - PostgreSQL users, key-value session cache and confirmation keys
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Session Model
//! - A login mints a random 256-bit session id and an HS256 token carrying it
//! - The session id keys a cached snapshot of the user with a fixed TTL
//! - A request is authenticated only while both the token and the cached
//!   session are valid; deleting the session revokes the token
//! - New accounts stay inactive until their mailed confirmation key is redeemed

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{AuthConfig, AuthGate, TokenIssuer};
pub use domain::{AuthContext, SessionUser};
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryUserRepository, PgUserRepository};
pub use presentation::{AuthAppState, auth_router, require_auth};
