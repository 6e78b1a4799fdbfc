//! Infrastructure Layer
//!
//! PostgreSQL items and locations, key-value comment threads and bids, plus
//! in-memory stand-ins.

pub mod bid_ledger;
pub mod memory;
pub mod postgres;
pub mod thread_store;

pub use bid_ledger::BidLedger;
pub use memory::MemoryMarketRepository;
pub use postgres::PgMarketRepository;
pub use thread_store::ThreadStore;
