//! In-memory item and location repository for tests and local runs without
//! PostgreSQL

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use kernel::id::{ItemId, LocationId};

use crate::domain::entity::item::{Item, ItemChanges, ItemOwner, NewItem};
use crate::domain::entity::location::{Location, LocationChanges};
use crate::domain::repository::{ItemRepository, LocationRepository};
use crate::domain::value_object::{item_name::ItemName, message_text::MessageText, phone_no::PhoneNo};
use crate::error::{MarketError, MarketResult};

/// Item row as stored; owner and location are resolved on read
#[derive(Debug, Clone)]
struct StoredItem {
    owner: ItemOwner,
    name: ItemName,
    phone_no: PhoneNo,
    location_id: LocationId,
    closed: bool,
    instruction: MessageText,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    items: HashMap<ItemId, StoredItem>,
    locations: HashMap<LocationId, Location>,
}

impl State {
    fn resolve(&self, item_id: &ItemId) -> Option<Item> {
        let stored = self.items.get(item_id)?;
        let location = self.locations.get(&stored.location_id)?.clone();
        Some(Item {
            item_id: *item_id,
            owner: stored.owner.clone(),
            name: stored.name.clone(),
            phone_no: stored.phone_no.clone(),
            location,
            closed: stored.closed,
            instruction: stored.instruction.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    fn open_items(&self, filter: impl Fn(&StoredItem) -> bool) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|(_, stored)| !stored.closed && filter(stored))
            .filter_map(|(id, _)| self.resolve(id))
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

#[derive(Clone, Default)]
pub struct MemoryMarketRepository {
    state: Arc<RwLock<State>>,
}

impl MemoryMarketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> MarketResult<T> {
        self.state
            .read()
            .map(|state| f(&state))
            .map_err(|_| MarketError::Internal("market store lock poisoned".into()))
    }

    fn write<T>(&self, f: impl FnOnce(&mut State) -> T) -> MarketResult<T> {
        self.state
            .write()
            .map(|mut state| f(&mut state))
            .map_err(|_| MarketError::Internal("market store lock poisoned".into()))
    }
}

impl ItemRepository for MemoryMarketRepository {
    async fn create_item(&self, item: &NewItem) -> MarketResult<Item> {
        self.write(|state| {
            if !state.locations.contains_key(&item.location_id) {
                return Err(MarketError::Internal("item references unknown location".into()));
            }
            state.items.insert(
                item.item_id,
                StoredItem {
                    owner: item.owner.clone(),
                    name: item.name.clone(),
                    phone_no: item.phone_no.clone(),
                    location_id: item.location_id,
                    closed: false,
                    instruction: item.instruction.clone(),
                    created_at: item.created_at,
                    updated_at: item.created_at,
                },
            );
            state
                .resolve(&item.item_id)
                .ok_or_else(|| MarketError::Internal("inserted item not readable".into()))
        })?
    }

    async fn find_item(&self, item_id: &ItemId) -> MarketResult<Option<Item>> {
        self.read(|state| state.resolve(item_id))
    }

    async fn update_item(
        &self,
        item_id: &ItemId,
        changes: &ItemChanges,
    ) -> MarketResult<Option<Item>> {
        self.write(|state| {
            let stored = state.items.get_mut(item_id)?;
            if let Some(name) = &changes.name {
                stored.name = name.clone();
            }
            if let Some(phone_no) = &changes.phone_no {
                stored.phone_no = phone_no.clone();
            }
            if let Some(location_id) = changes.location_id {
                stored.location_id = location_id;
            }
            if let Some(instruction) = &changes.instruction {
                stored.instruction = instruction.clone();
            }
            stored.updated_at = Utc::now();
            state.resolve(item_id)
        })
    }

    async fn close_item(&self, item_id: &ItemId) -> MarketResult<Option<Item>> {
        self.write(|state| {
            let stored = state.items.get_mut(item_id)?;
            stored.closed = true;
            stored.updated_at = Utc::now();
            state.resolve(item_id)
        })
    }

    async fn list_open_items(&self) -> MarketResult<Vec<Item>> {
        self.read(|state| state.open_items(|_| true))
    }

    async fn list_open_items_in(&self, location_id: &LocationId) -> MarketResult<Vec<Item>> {
        self.read(|state| state.open_items(|stored| stored.location_id == *location_id))
    }
}

impl LocationRepository for MemoryMarketRepository {
    async fn create_location(&self, location: &Location) -> MarketResult<()> {
        self.write(|state| {
            state.locations.insert(location.location_id, location.clone());
        })
    }

    async fn find_location(&self, location_id: &LocationId) -> MarketResult<Option<Location>> {
        self.read(|state| state.locations.get(location_id).cloned())
    }

    async fn list_locations(&self) -> MarketResult<Vec<Location>> {
        self.read(|state| {
            let mut all: Vec<Location> = state.locations.values().cloned().collect();
            all.sort_by(|a, b| {
                (&a.country, a.state.as_str(), a.city.as_str())
                    .cmp(&(&b.country, b.state.as_str(), b.city.as_str()))
            });
            all
        })
    }

    async fn update_location(
        &self,
        location_id: &LocationId,
        changes: &LocationChanges,
    ) -> MarketResult<Option<Location>> {
        self.write(|state| {
            let location = state.locations.get_mut(location_id)?;
            location.apply(changes);
            Some(location.clone())
        })
    }
}
