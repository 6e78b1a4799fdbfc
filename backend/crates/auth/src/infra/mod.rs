//! Infrastructure Layer
//!
//! PostgreSQL and key-value implementations, plus in-memory stand-ins.

pub mod confirmation;
pub mod memory;
pub mod postgres;
pub mod session_cache;

pub use confirmation::ConfirmationKeys;
pub use memory::MemoryUserRepository;
pub use postgres::PgUserRepository;
pub use session_cache::{SESSION_TTL, SessionCache};
