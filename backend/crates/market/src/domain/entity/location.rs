//! Location Entity

use chrono::{DateTime, Utc};
use kernel::id::{LocationId, UserId};

use crate::domain::value_object::{country::Country, place_name::PlaceName};

/// Place an item is offered in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub location_id: LocationId,
    pub city: PlaceName,
    pub state: PlaceName,
    /// Display name from the country table
    pub country: String,
    pub country_code: String,
    /// User who registered the location; cleared when that account is deleted
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(city: PlaceName, state: PlaceName, country: Country, owner_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            location_id: LocationId::new(),
            city,
            state,
            country: country.name().to_string(),
            country_code: country.code().to_string(),
            owner_id: Some(owner_id),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner_id.as_ref() == Some(user_id)
    }

    pub fn apply(&mut self, changes: &LocationChanges) {
        if let Some(city) = &changes.city {
            self.city = city.clone();
        }
        if let Some(state) = &changes.state {
            self.state = state.clone();
        }
        if let Some(country) = &changes.country {
            self.country = country.name().to_string();
            self.country_code = country.code().to_string();
        }
        self.updated_at = Utc::now();
    }
}

/// Fields an owner may change; nothing else is updatable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationChanges {
    pub city: Option<PlaceName>,
    pub state: Option<PlaceName>,
    pub country: Option<Country>,
}

impl LocationChanges {
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none() && self.country.is_none()
    }
}
