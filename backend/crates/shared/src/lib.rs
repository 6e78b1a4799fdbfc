//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of marketplace vocabulary:
//! - The unified error type rendered as the JSON error envelope
//! - Typed identifiers for users, items, locations, comments and replies
//! - Per-field validation collection
//! - Request extractors rejecting with the JSON error envelope (`axum` feature)
//!
//! Only things with the same meaning in every domain crate belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
#[cfg(feature = "axum")]
pub mod extract;
pub mod id;
pub mod validation;
