//! Application Layer
//!
//! Use cases for listings, bids, comment threads, locations and live feeds.

pub mod bids;
pub mod comments;
pub mod config;
pub mod feed;
pub mod items;
pub mod locations;
pub mod notification;

// Re-exports
pub use bids::BidUseCase;
pub use comments::{CommentThread, CommentUseCase};
pub use config::MarketConfig;
pub use feed::{FeedEnd, FeedError, FeedScope, FeedSink, LiveFeed};
pub use items::{CreateItemInput, ItemDetail, ItemUseCase, UpdateItemInput};
pub use locations::{CreateLocationInput, LocationUseCase, UpdateLocationInput};

use kernel::error::app_error::AppResult;
use kernel::validation::Validator;

use crate::error::{MarketError, MarketResult};

/// Validate a single request field
pub(crate) fn validate_field<T>(field: &str, result: AppResult<T>) -> MarketResult<T> {
    let mut v = Validator::new();
    v.check(field, result)
        .ok_or_else(|| MarketError::Validation(v.into_errors()))
}
