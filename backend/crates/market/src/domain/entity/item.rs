//! Item Entity

use chrono::{DateTime, Utc};
use kernel::id::{ItemId, LocationId, UserId};

use crate::domain::entity::location::Location;
use crate::domain::value_object::{item_name::ItemName, message_text::MessageText, phone_no::PhoneNo};
use crate::error::{MarketError, MarketResult};

/// Seller identity as resolved from the users table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOwner {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
}

/// Listing with its owner and location resolved
#[derive(Debug, Clone)]
pub struct Item {
    pub item_id: ItemId,
    pub owner: ItemOwner,
    pub name: ItemName,
    pub phone_no: PhoneNo,
    pub location: Location,
    /// Once set, no further bids or edits
    pub closed: bool,
    pub instruction: MessageText,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner.user_id == *user_id
    }

    pub fn ensure_open(&self) -> MarketResult<()> {
        if self.closed {
            Err(MarketError::ItemClosed)
        } else {
            Ok(())
        }
    }
}

/// Listing as submitted, before the store resolves joins
#[derive(Debug, Clone)]
pub struct NewItem {
    pub item_id: ItemId,
    pub owner: ItemOwner,
    pub name: ItemName,
    pub phone_no: PhoneNo,
    pub location_id: LocationId,
    pub instruction: MessageText,
    pub created_at: DateTime<Utc>,
}

impl NewItem {
    pub fn new(
        owner: ItemOwner,
        name: ItemName,
        phone_no: PhoneNo,
        location_id: LocationId,
        instruction: MessageText,
    ) -> Self {
        Self {
            item_id: ItemId::new(),
            owner,
            name,
            phone_no,
            location_id,
            instruction,
            created_at: Utc::now(),
        }
    }
}

/// Fields an owner may change on an open listing
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<ItemName>,
    pub phone_no: Option<PhoneNo>,
    pub location_id: Option<LocationId>,
    pub instruction: Option<MessageText>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone_no.is_none()
            && self.location_id.is_none()
            && self.instruction.is_none()
    }
}
