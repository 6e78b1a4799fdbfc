//! Market Crate
//!
//! Listings, bids, comment threads, locations and live item feeds.
//!
//! Items and locations live in PostgreSQL. Comment threads and bids live
//! in the key-value store as flat records plus sorted-set indexes.
//!
//! # Layers
//!
//! - `domain`: entities, value objects and repository traits
//! - `application`: use cases and the live feed loop
//! - `infra`: PostgreSQL and in-memory repositories, thread store, bid ledger
//! - `presentation`: DTOs, handlers, WebSocket feeds and the router

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports
pub use application::MarketConfig;
pub use error::{MarketError, MarketResult};
pub use infra::{MemoryMarketRepository, PgMarketRepository};
pub use presentation::{MarketAppState, market_router};
