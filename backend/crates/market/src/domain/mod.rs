//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::item::{Item, ItemChanges, ItemOwner, NewItem};
pub use entity::location::{Location, LocationChanges};
pub use entity::thread::{Author, Comment, Reply};
pub use repository::{ItemRepository, LocationRepository, SharedMarketRepository};
