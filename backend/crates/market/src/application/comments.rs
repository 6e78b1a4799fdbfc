//! Comment Thread Use Cases
//!
//! Reads are public. Writes need an active account, and edits or deletes
//! are limited to the author.

use std::sync::Arc;

use auth::{AuthContext, SessionUser};
use kernel::id::{CommentId, ItemId, ReplyId};
use platform::kv::SharedKv;

use crate::application::validate_field;
use crate::domain::entity::thread::{Author, Comment, Reply};
use crate::domain::repository::SharedMarketRepository;
use crate::domain::value_object::message_text::MessageText;
use crate::error::{MarketError, MarketResult};
use crate::infra::thread_store::ThreadStore;

/// A comment with its replies in creation order
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Reply>,
}

pub struct CommentUseCase<R, K> {
    repo: Arc<R>,
    threads: ThreadStore<K>,
}

fn author(user: &SessionUser) -> Author {
    Author {
        user_id: user.user_id,
        display_name: user.display_name.clone(),
    }
}

fn body(text: String) -> MarketResult<MessageText> {
    validate_field("body", MessageText::new(text))
}

impl<R, K> CommentUseCase<R, K>
where
    R: SharedMarketRepository,
    K: SharedKv,
{
    pub fn new(repo: Arc<R>, threads: ThreadStore<K>) -> Self {
        Self { repo, threads }
    }

    /// Comments are allowed on closed items; the item only has to exist
    pub async fn create(
        &self,
        ctx: &AuthContext,
        item_id: &ItemId,
        text: String,
    ) -> MarketResult<Comment> {
        let user = ctx.require_active()?;
        let body = body(text)?;
        if self.repo.find_item(item_id).await?.is_none() {
            return Err(MarketError::ItemNotFound);
        }

        let comment = self
            .threads
            .create_comment(item_id, &author(user), &body)
            .await?;

        tracing::info!(comment_id = %comment.comment_id, %item_id, "Comment posted");

        Ok(comment)
    }

    pub async fn get(&self, comment_id: &CommentId) -> MarketResult<CommentThread> {
        let comment = self.threads.get_comment(comment_id).await?;
        let replies = self.threads.get_replies(comment_id).await?;
        Ok(CommentThread { comment, replies })
    }

    pub async fn item_comments(&self, item_id: &ItemId) -> MarketResult<Vec<Comment>> {
        self.threads.get_item_comments(item_id).await
    }

    pub async fn update(
        &self,
        ctx: &AuthContext,
        comment_id: &CommentId,
        text: String,
    ) -> MarketResult<Comment> {
        let user = ctx.require_active()?;
        let body = body(text)?;
        let comment = self.authored_comment(comment_id, user).await?;
        self.threads.update_comment(&comment, &body).await
    }

    /// Removes the comment and every reply under it
    pub async fn delete(&self, ctx: &AuthContext, comment_id: &CommentId) -> MarketResult<()> {
        let user = ctx.require_active()?;
        let comment = self.authored_comment(comment_id, user).await?;
        self.threads.delete_comment(&comment).await?;

        tracing::info!(%comment_id, "Comment deleted");

        Ok(())
    }

    // ========================================================================
    // Replies
    // ========================================================================

    pub async fn create_reply(
        &self,
        ctx: &AuthContext,
        comment_id: &CommentId,
        text: String,
    ) -> MarketResult<Reply> {
        let user = ctx.require_active()?;
        let body = body(text)?;
        self.threads
            .create_reply(comment_id, &author(user), &body)
            .await
    }

    pub async fn replies(&self, comment_id: &CommentId) -> MarketResult<Vec<Reply>> {
        self.threads.get_replies(comment_id).await
    }

    pub async fn update_reply(
        &self,
        ctx: &AuthContext,
        comment_id: &CommentId,
        reply_id: &ReplyId,
        text: String,
    ) -> MarketResult<Reply> {
        let user = ctx.require_active()?;
        let body = body(text)?;
        let reply = self.authored_reply(comment_id, reply_id, user).await?;
        self.threads.update_reply(&reply, &body).await
    }

    pub async fn delete_reply(
        &self,
        ctx: &AuthContext,
        comment_id: &CommentId,
        reply_id: &ReplyId,
    ) -> MarketResult<()> {
        let user = ctx.require_active()?;
        let reply = self.authored_reply(comment_id, reply_id, user).await?;
        self.threads.delete_reply(&reply).await
    }

    async fn authored_comment(
        &self,
        comment_id: &CommentId,
        user: &SessionUser,
    ) -> MarketResult<Comment> {
        let comment = self.threads.get_comment(comment_id).await?;
        if !comment.is_authored_by(&user.user_id) {
            return Err(MarketError::NotOwner);
        }
        Ok(comment)
    }

    /// A reply addressed under the wrong comment does not exist
    async fn authored_reply(
        &self,
        comment_id: &CommentId,
        reply_id: &ReplyId,
        user: &SessionUser,
    ) -> MarketResult<Reply> {
        let reply = self.threads.get_reply(reply_id).await?;
        if reply.comment_id != *comment_id {
            return Err(MarketError::ReplyNotFound);
        }
        if !reply.is_authored_by(&user.user_id) {
            return Err(MarketError::NotOwner);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::Fixture;
    use auth::AuthError;

    #[tokio::test]
    async fn test_thread_lifecycle() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        let bob = fx.user("bob", true);
        let item = fx.listing(&ada).await;

        let comment = fx
            .comments()
            .create(&bob, &item.item_id, "Still available?".into())
            .await
            .unwrap();
        assert_eq!(comment.author, "bob");

        fx.comments()
            .create_reply(&ada, &comment.comment_id, "Yes".into())
            .await
            .unwrap();
        fx.comments()
            .create_reply(&bob, &comment.comment_id, "Great".into())
            .await
            .unwrap();

        let thread = fx.comments().get(&comment.comment_id).await.unwrap();
        assert_eq!(thread.comment.reply_count, 2);
        let bodies: Vec<_> = thread.replies.iter().map(|r| r.body.as_str()).collect();
        assert_eq!(bodies, ["Yes", "Great"]);

        fx.comments().delete(&bob, &comment.comment_id).await.unwrap();
        assert!(fx.comments().replies(&comment.comment_id).await.unwrap().is_empty());
        assert!(fx.comments().item_comments(&item.item_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comments_allowed_on_closed_items_but_not_missing_ones() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        let item = fx.listing(&ada).await;
        fx.items().close(&ada, &item.item_id).await.unwrap();

        assert!(fx.comments().create(&ada, &item.item_id, "Sold".into()).await.is_ok());
        assert!(matches!(
            fx.comments().create(&ada, &ItemId::new(), "hello".into()).await,
            Err(MarketError::ItemNotFound)
        ));
    }

    #[tokio::test]
    async fn test_only_author_edits_or_deletes() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        let bob = fx.user("bob", true);
        let item = fx.listing(&ada).await;
        let comment = fx
            .comments()
            .create(&bob, &item.item_id, "first".into())
            .await
            .unwrap();

        assert!(matches!(
            fx.comments().update(&ada, &comment.comment_id, "hijack".into()).await,
            Err(MarketError::NotOwner)
        ));
        assert!(matches!(
            fx.comments().delete(&ada, &comment.comment_id).await,
            Err(MarketError::NotOwner)
        ));

        let edited = fx
            .comments()
            .update(&bob, &comment.comment_id, "edited".into())
            .await
            .unwrap();
        assert_eq!(edited.body, "edited");
        assert!(edited.updated_at >= comment.updated_at);
    }

    #[tokio::test]
    async fn test_reply_must_belong_to_the_addressed_comment() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        let item = fx.listing(&ada).await;
        let first = fx.comments().create(&ada, &item.item_id, "one".into()).await.unwrap();
        let second = fx.comments().create(&ada, &item.item_id, "two".into()).await.unwrap();
        let reply = fx
            .comments()
            .create_reply(&ada, &first.comment_id, "reply".into())
            .await
            .unwrap();

        assert!(matches!(
            fx.comments()
                .delete_reply(&ada, &second.comment_id, &reply.reply_id)
                .await,
            Err(MarketError::ReplyNotFound)
        ));
        assert!(matches!(
            fx.comments()
                .update_reply(&fx.user("bob", true), &first.comment_id, &reply.reply_id, "x".into())
                .await,
            Err(MarketError::NotOwner)
        ));
        fx.comments()
            .delete_reply(&ada, &first.comment_id, &reply.reply_id)
            .await
            .unwrap();
        assert_eq!(fx.comments().get(&first.comment_id).await.unwrap().comment.reply_count, 0);
    }

    #[tokio::test]
    async fn test_reply_to_missing_comment() {
        let fx = Fixture::new().await;
        let err = fx
            .comments()
            .create_reply(&fx.user("ada", true), &CommentId::now_v7(), "hi".into())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::CommentNotFound));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_comment() {
        let fx = Fixture::new().await;
        let item = fx.listing(&fx.user("ada", true)).await;
        let err = fx
            .comments()
            .create(&fx.user("bob", false), &item.item_id, "hi".into())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Auth(AuthError::AccountInactive)));
    }
}
