//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and live feed sockets.

pub mod dto;
pub mod handlers;
pub mod live;
pub mod router;

pub use handlers::MarketAppState;
pub use router::market_router;
