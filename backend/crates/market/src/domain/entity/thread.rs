//! Comment threads
//!
//! Comments hang off an item, replies off a comment. Both live in the
//! key-value store, ordered by creation time.

use chrono::{DateTime, Utc};
use kernel::id::{CommentId, ItemId, ReplyId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub comment_id: CommentId,
    pub item_id: ItemId,
    /// Display name at posting time
    pub author: String,
    pub author_id: UserId,
    pub body: String,
    /// Derived from the reply index, never stored
    pub reply_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub reply_id: ReplyId,
    pub comment_id: CommentId,
    pub author: String,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who is posting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub user_id: UserId,
    pub display_name: String,
}

impl Comment {
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        self.author_id == *user_id
    }
}

impl Reply {
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        self.author_id == *user_id
    }
}
