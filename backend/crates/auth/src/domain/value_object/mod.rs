//! Value Object Module

pub mod display_name;
pub mod email;
pub mod person_name;
pub mod session_id;
pub mod user_password;
