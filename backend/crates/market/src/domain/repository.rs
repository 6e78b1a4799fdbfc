//! Repository Traits
//!
//! Relational persistence for items and locations. Comment threads and bids
//! live in the key-value store (see `infra::thread_store`,
//! `infra::bid_ledger`).

use kernel::id::{ItemId, LocationId};

use crate::domain::entity::item::{Item, ItemChanges, NewItem};
use crate::domain::entity::location::{Location, LocationChanges};
use crate::error::MarketResult;

#[trait_variant::make(ItemRepository: Send)]
pub trait LocalItemRepository {
    /// Insert and return the listing with owner and location resolved
    async fn create_item(&self, item: &NewItem) -> MarketResult<Item>;

    async fn find_item(&self, item_id: &ItemId) -> MarketResult<Option<Item>>;

    /// `None` if the item does not exist
    async fn update_item(&self, item_id: &ItemId, changes: &ItemChanges)
    -> MarketResult<Option<Item>>;

    async fn close_item(&self, item_id: &ItemId) -> MarketResult<Option<Item>>;

    /// Open listings, newest first
    async fn list_open_items(&self) -> MarketResult<Vec<Item>>;

    /// Open listings in one location, newest first
    async fn list_open_items_in(&self, location_id: &LocationId) -> MarketResult<Vec<Item>>;
}

#[trait_variant::make(LocationRepository: Send)]
pub trait LocalLocationRepository {
    async fn create_location(&self, location: &Location) -> MarketResult<()>;

    async fn find_location(&self, location_id: &LocationId) -> MarketResult<Option<Location>>;

    /// Ordered by country, state, city
    async fn list_locations(&self) -> MarketResult<Vec<Location>>;

    async fn update_location(
        &self,
        location_id: &LocationId,
        changes: &LocationChanges,
    ) -> MarketResult<Option<Location>>;
}

/// Bound for repositories held in shared application state
pub trait SharedMarketRepository:
    ItemRepository + LocationRepository + Send + Sync + 'static
{
}

impl<T> SharedMarketRepository for T where
    T: ItemRepository + LocationRepository + Send + Sync + 'static
{
}
