//! API DTOs (Data Transfer Objects)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kernel::id::{CommentId, ItemId, LocationId, ReplyId, UserId};
use serde::{Deserialize, Serialize};

use crate::application::{
    CommentThread, CreateItemInput, CreateLocationInput, ItemDetail, UpdateItemInput,
    UpdateLocationInput,
};
use crate::domain::entity::item::Item;
use crate::domain::entity::location::Location;
use crate::domain::entity::thread::{Comment, Reply};

// ============================================================================
// Query strings
// ============================================================================

/// `?id=` on item, comment, reply and location routes
#[derive(Debug, Deserialize)]
pub struct IdQuery<T> {
    pub id: T,
}

#[derive(Debug, Deserialize)]
pub struct LocationIdQuery {
    pub location_id: LocationId,
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub phone_no: String,
    pub location_id: LocationId,
    #[serde(default)]
    pub instruction: Option<String>,
}

impl From<CreateItemRequest> for CreateItemInput {
    fn from(req: CreateItemRequest) -> Self {
        Self {
            name: req.name,
            phone_no: req.phone_no,
            location_id: req.location_id,
            instruction: req.instruction,
        }
    }
}

/// Only these fields may change; anything else is rejected
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub phone_no: Option<String>,
    pub location_id: Option<LocationId>,
    pub instruction: Option<String>,
}

impl From<UpdateItemRequest> for UpdateItemInput {
    fn from(req: UpdateItemRequest) -> Self {
        Self {
            name: req.name,
            phone_no: req.phone_no,
            location_id: req.location_id,
            instruction: req.instruction,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub user_id: UserId,
    pub display_name: String,
    /// Seller contact
    pub user_email: String,
    pub phone_no: String,
    pub location: LocationResponse,
    pub closed: bool,
    pub instruction: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.item_id,
            name: item.name.as_str().to_string(),
            user_id: item.owner.user_id,
            display_name: item.owner.display_name.clone(),
            user_email: item.owner.email.clone(),
            phone_no: item.phone_no.as_str().to_string(),
            location: LocationResponse::public(&item.location),
            closed: item.closed,
            instruction: item.instruction.as_str().to_string(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self::from(&item)
    }
}

#[derive(Debug, Serialize)]
pub struct ItemDetailResponse {
    #[serde(flatten)]
    pub item: ItemResponse,
    /// `null` when the thread store could not be read
    pub comments: Option<Vec<CommentResponse>>,
}

impl From<ItemDetail> for ItemDetailResponse {
    fn from(detail: ItemDetail) -> Self {
        Self {
            item: ItemResponse::from(&detail.item),
            comments: detail
                .comments
                .map(|comments| comments.into_iter().map(CommentResponse::from).collect()),
        }
    }
}

// ============================================================================
// Bids
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub message: String,
}

/// Bidder display name to bid message
#[derive(Debug, Serialize)]
pub struct BidsResponse {
    pub bids: BTreeMap<String, String>,
}

// ============================================================================
// Comments and replies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub item_id: ItemId,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyRequest {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: CommentId,
    pub item_id: ItemId,
    pub author: String,
    pub user_id: UserId,
    pub comment: String,
    pub reply_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<ReplyResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.comment_id,
            item_id: comment.item_id,
            author: comment.author,
            user_id: comment.author_id,
            comment: comment.body,
            reply_count: comment.reply_count,
            replies: None,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

impl From<CommentThread> for CommentResponse {
    fn from(thread: CommentThread) -> Self {
        Self {
            replies: Some(thread.replies.into_iter().map(ReplyResponse::from).collect()),
            ..Self::from(thread.comment)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub id: ReplyId,
    pub comment_id: CommentId,
    pub author: String,
    pub user_id: UserId,
    pub reply: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reply> for ReplyResponse {
    fn from(reply: Reply) -> Self {
        Self {
            id: reply.reply_id,
            comment_id: reply.comment_id,
            author: reply.author,
            user_id: reply.author_id,
            reply: reply.body,
            created_at: reply.created_at,
            updated_at: reply.updated_at,
        }
    }
}

// ============================================================================
// Locations
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub city: String,
    pub state: String,
    pub country_code: String,
}

impl From<CreateLocationRequest> for CreateLocationInput {
    fn from(req: CreateLocationRequest) -> Self {
        Self {
            city: req.city,
            state: req.state,
            country_code: req.country_code,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateLocationRequest {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_code: Option<String>,
}

impl From<UpdateLocationRequest> for UpdateLocationInput {
    fn from(req: UpdateLocationRequest) -> Self {
        Self {
            city: req.city,
            state: req.state,
            country_code: req.country_code,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    pub id: LocationId,
    pub city: String,
    pub state: String,
    pub country: String,
    pub country_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocationResponse {
    /// Without the owner id
    pub fn public(location: &Location) -> Self {
        Self {
            id: location.location_id,
            city: location.city.as_str().to_string(),
            state: location.state.as_str().to_string(),
            country: location.country.clone(),
            country_code: location.country_code.clone(),
            user_id: None,
            created_at: location.created_at,
            updated_at: location.updated_at,
        }
    }

    pub fn with_owner(location: &Location) -> Self {
        Self {
            user_id: location.owner_id,
            ..Self::public(location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_requests_reject_unknown_fields() {
        let err = serde_json::from_value::<UpdateItemRequest>(json!({ "closed": true }));
        assert!(err.is_err());
        let err = serde_json::from_value::<UpdateLocationRequest>(json!({ "user_id": "x" }));
        assert!(err.is_err());
        let ok = serde_json::from_value::<UpdateLocationRequest>(json!({ "city": "Ibadan" }));
        assert_eq!(ok.unwrap().city.as_deref(), Some("Ibadan"));
    }
}
