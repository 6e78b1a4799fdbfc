//! Thread Store
//!
//! Comments and replies in the key-value store:
//!
//! - `item:{item_id}:comments` sorted set of comment ids
//! - `comment:{comment_id}` hash record
//! - `replies:{comment_id}` sorted set of reply ids
//! - `reply:{reply_id}` hash record
//!
//! Scores are creation times in microseconds, so ranges come back in
//! creation order; equal scores fall back to the member order, which for
//! UUIDv7 ids is creation order too. An index entry and its record are
//! always written and removed in the same atomic batch.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use kernel::id::{CommentId, ItemId, ReplyId};
use platform::kv::{KvBatch, SharedKv};

use crate::domain::entity::thread::{Author, Comment, Reply};
use crate::domain::value_object::message_text::MessageText;
use crate::error::{MarketError, MarketResult};

const F_ID: &str = "id";
const F_ITEM_ID: &str = "itemID";
const F_COMMENT_ID: &str = "commentID";
const F_AUTHOR: &str = "author";
const F_USER_ID: &str = "userID";
const F_BODY: &str = "body";
const F_CREATED_AT: &str = "createdAt";
const F_UPDATED_AT: &str = "updatedAt";

fn item_comments_key(item_id: &ItemId) -> String {
    format!("item:{item_id}:comments")
}

fn comment_key(comment_id: &CommentId) -> String {
    format!("comment:{comment_id}")
}

fn replies_key(comment_id: &CommentId) -> String {
    format!("replies:{comment_id}")
}

fn reply_key(reply_id: impl std::fmt::Display) -> String {
    format!("reply:{reply_id}")
}

fn score(at: &DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64
}

/// Stored timestamps carry microseconds; trim so a created entity equals
/// its re-read record.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn comment_fields(comment: &Comment) -> Vec<(String, String)> {
    vec![
        (F_ID.into(), comment.comment_id.to_string()),
        (F_ITEM_ID.into(), comment.item_id.to_string()),
        (F_AUTHOR.into(), comment.author.clone()),
        (F_USER_ID.into(), comment.author_id.to_string()),
        (F_BODY.into(), comment.body.clone()),
        (F_CREATED_AT.into(), format_time(&comment.created_at)),
        (F_UPDATED_AT.into(), format_time(&comment.updated_at)),
    ]
}

fn comment_from_fields(fields: &HashMap<String, String>) -> Option<Comment> {
    Some(Comment {
        comment_id: fields.get(F_ID)?.parse().ok()?,
        item_id: fields.get(F_ITEM_ID)?.parse().ok()?,
        author: fields.get(F_AUTHOR)?.clone(),
        author_id: fields.get(F_USER_ID)?.parse().ok()?,
        body: fields.get(F_BODY)?.clone(),
        reply_count: 0,
        created_at: parse_time(fields.get(F_CREATED_AT)?)?,
        updated_at: parse_time(fields.get(F_UPDATED_AT)?)?,
    })
}

fn reply_fields(reply: &Reply) -> Vec<(String, String)> {
    vec![
        (F_ID.into(), reply.reply_id.to_string()),
        (F_COMMENT_ID.into(), reply.comment_id.to_string()),
        (F_AUTHOR.into(), reply.author.clone()),
        (F_USER_ID.into(), reply.author_id.to_string()),
        (F_BODY.into(), reply.body.clone()),
        (F_CREATED_AT.into(), format_time(&reply.created_at)),
        (F_UPDATED_AT.into(), format_time(&reply.updated_at)),
    ]
}

fn reply_from_fields(fields: &HashMap<String, String>) -> Option<Reply> {
    Some(Reply {
        reply_id: fields.get(F_ID)?.parse().ok()?,
        comment_id: fields.get(F_COMMENT_ID)?.parse().ok()?,
        author: fields.get(F_AUTHOR)?.clone(),
        author_id: fields.get(F_USER_ID)?.parse().ok()?,
        body: fields.get(F_BODY)?.clone(),
        created_at: parse_time(fields.get(F_CREATED_AT)?)?,
        updated_at: parse_time(fields.get(F_UPDATED_AT)?)?,
    })
}

#[derive(Clone)]
pub struct ThreadStore<K> {
    kv: K,
}

impl<K: SharedKv> ThreadStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    // ========================================================================
    // Comments
    // ========================================================================

    pub async fn create_comment(
        &self,
        item_id: &ItemId,
        author: &Author,
        body: &MessageText,
    ) -> MarketResult<Comment> {
        let created_at = now();
        let comment = Comment {
            comment_id: CommentId::now_v7(),
            item_id: *item_id,
            author: author.display_name.clone(),
            author_id: author.user_id,
            body: body.as_str().to_string(),
            reply_count: 0,
            created_at,
            updated_at: created_at,
        };

        let batch = KvBatch::new()
            .sorted_add(
                item_comments_key(item_id),
                score(&created_at),
                comment.comment_id.to_string(),
            )
            .hash_set(comment_key(&comment.comment_id), comment_fields(&comment));
        self.kv.apply(batch).await?;

        Ok(comment)
    }

    /// Comment with its reply count
    pub async fn get_comment(&self, comment_id: &CommentId) -> MarketResult<Comment> {
        let mut comment = self
            .read_comment(comment_id)
            .await?
            .ok_or(MarketError::CommentNotFound)?;
        comment.reply_count = self.kv.sorted_count(&replies_key(comment_id)).await?;
        Ok(comment)
    }

    /// Comments on an item in creation order, each with its reply count.
    /// Index entries whose record is missing or unreadable are skipped.
    pub async fn get_item_comments(&self, item_id: &ItemId) -> MarketResult<Vec<Comment>> {
        let ids = self.kv.sorted_range(&item_comments_key(item_id)).await?;
        let mut comments = Vec::with_capacity(ids.len());

        for raw in ids {
            let Ok(comment_id) = raw.parse::<CommentId>() else {
                tracing::warn!(member = %raw, %item_id, "Skipping malformed comment index entry");
                continue;
            };
            match self.get_comment(&comment_id).await {
                Ok(comment) => comments.push(comment),
                Err(e) => {
                    tracing::warn!(error = %e, %comment_id, %item_id, "Skipping unreadable comment");
                }
            }
        }

        Ok(comments)
    }

    /// Overwrite the body of a comment that still exists; the index is untouched
    pub async fn update_comment(&self, comment: &Comment, body: &MessageText) -> MarketResult<Comment> {
        let mut updated = comment.clone();
        updated.body = body.as_str().to_string();
        updated.updated_at = now();

        let fields = vec![
            (F_BODY.into(), updated.body.clone()),
            (F_UPDATED_AT.into(), format_time(&updated.updated_at)),
        ];
        if !self.kv.hash_update(&comment_key(&comment.comment_id), fields, None).await? {
            return Err(MarketError::CommentNotFound);
        }

        Ok(updated)
    }

    /// Remove a comment and every reply under it.
    ///
    /// The comment disappears first, in one batch with its index entry. The
    /// replies go in a second batch; if reading the reply index or that
    /// batch fails, the error is returned and the reply records stay behind
    /// as orphans.
    pub async fn delete_comment(&self, comment: &Comment) -> MarketResult<()> {
        let comment_id = &comment.comment_id;

        let batch = KvBatch::new()
            .sorted_remove(item_comments_key(&comment.item_id), comment_id.to_string())
            .delete(comment_key(comment_id));
        self.kv.apply(batch).await?;

        let index = replies_key(comment_id);
        let reply_ids = self.kv.sorted_range(&index).await.inspect_err(|e| {
            tracing::error!(error = %e, %comment_id, "Comment deleted but its replies were not");
        })?;

        let batch = reply_ids
            .iter()
            .fold(KvBatch::new(), |batch, id| batch.delete(reply_key(id)))
            .delete(index);
        self.kv.apply(batch).await.inspect_err(|e| {
            tracing::error!(
                error = %e,
                %comment_id,
                replies = reply_ids.len(),
                "Comment deleted but its replies were not"
            );
        })?;

        Ok(())
    }

    // ========================================================================
    // Replies
    // ========================================================================

    /// The parent comment must exist
    pub async fn create_reply(
        &self,
        comment_id: &CommentId,
        author: &Author,
        body: &MessageText,
    ) -> MarketResult<Reply> {
        if self.read_comment(comment_id).await?.is_none() {
            return Err(MarketError::CommentNotFound);
        }

        let created_at = now();
        let reply = Reply {
            reply_id: ReplyId::now_v7(),
            comment_id: *comment_id,
            author: author.display_name.clone(),
            author_id: author.user_id,
            body: body.as_str().to_string(),
            created_at,
            updated_at: created_at,
        };

        let batch = KvBatch::new()
            .sorted_add(
                replies_key(comment_id),
                score(&created_at),
                reply.reply_id.to_string(),
            )
            .hash_set(reply_key(&reply.reply_id), reply_fields(&reply));
        self.kv.apply(batch).await?;

        Ok(reply)
    }

    pub async fn get_reply(&self, reply_id: &ReplyId) -> MarketResult<Reply> {
        let fields = self.kv.hash_get_all(&reply_key(reply_id)).await?;
        if fields.is_empty() {
            return Err(MarketError::ReplyNotFound);
        }
        reply_from_fields(&fields).ok_or_else(|| {
            tracing::warn!(%reply_id, "Unreadable reply record");
            MarketError::ReplyNotFound
        })
    }

    /// Replies in creation order; missing or unreadable records are skipped
    pub async fn get_replies(&self, comment_id: &CommentId) -> MarketResult<Vec<Reply>> {
        let ids = self.kv.sorted_range(&replies_key(comment_id)).await?;
        let mut replies = Vec::with_capacity(ids.len());

        for raw in ids {
            let Ok(reply_id) = raw.parse::<ReplyId>() else {
                tracing::warn!(member = %raw, %comment_id, "Skipping malformed reply index entry");
                continue;
            };
            match self.get_reply(&reply_id).await {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    tracing::warn!(error = %e, %reply_id, %comment_id, "Skipping unreadable reply");
                }
            }
        }

        Ok(replies)
    }

    pub async fn update_reply(&self, reply: &Reply, body: &MessageText) -> MarketResult<Reply> {
        let mut updated = reply.clone();
        updated.body = body.as_str().to_string();
        updated.updated_at = now();

        let fields = vec![
            (F_BODY.into(), updated.body.clone()),
            (F_UPDATED_AT.into(), format_time(&updated.updated_at)),
        ];
        if !self.kv.hash_update(&reply_key(&reply.reply_id), fields, None).await? {
            return Err(MarketError::ReplyNotFound);
        }

        Ok(updated)
    }

    pub async fn delete_reply(&self, reply: &Reply) -> MarketResult<()> {
        let batch = KvBatch::new()
            .sorted_remove(replies_key(&reply.comment_id), reply.reply_id.to_string())
            .delete(reply_key(&reply.reply_id));
        self.kv.apply(batch).await?;
        Ok(())
    }

    async fn read_comment(&self, comment_id: &CommentId) -> MarketResult<Option<Comment>> {
        let fields = self.kv.hash_get_all(&comment_key(comment_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        let comment = comment_from_fields(&fields);
        if comment.is_none() {
            tracing::warn!(%comment_id, "Unreadable comment record");
        }
        Ok(comment)
    }
}
