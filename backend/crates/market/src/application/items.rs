//! Item Use Cases
//!
//! Listing creation, lookup with comments, owner edits and closing.

use std::sync::Arc;

use auth::AuthContext;
use kernel::id::{ItemId, LocationId};
use kernel::validation::Validator;
use platform::kv::SharedKv;

use crate::domain::entity::item::{Item, ItemChanges, ItemOwner, NewItem};
use crate::domain::entity::thread::Comment;
use crate::domain::repository::SharedMarketRepository;
use crate::domain::value_object::{item_name::ItemName, message_text::MessageText, phone_no::PhoneNo};
use crate::error::{MarketError, MarketResult};
use crate::infra::thread_store::ThreadStore;

const UNKNOWN_LOCATION: &str = "Please supply a valid location";

pub struct CreateItemInput {
    pub name: String,
    pub phone_no: String,
    pub location_id: LocationId,
    pub instruction: Option<String>,
}

#[derive(Debug, Default)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub phone_no: Option<String>,
    pub location_id: Option<LocationId>,
    pub instruction: Option<String>,
}

/// Item with its comment thread. `comments` is `None` when the thread store
/// could not be read, which is different from an empty thread.
pub struct ItemDetail {
    pub item: Item,
    pub comments: Option<Vec<Comment>>,
}

pub struct ItemUseCase<R, K> {
    repo: Arc<R>,
    threads: ThreadStore<K>,
}

impl<R, K> ItemUseCase<R, K>
where
    R: SharedMarketRepository,
    K: SharedKv,
{
    pub fn new(repo: Arc<R>, threads: ThreadStore<K>) -> Self {
        Self { repo, threads }
    }

    pub async fn create(&self, ctx: &AuthContext, input: CreateItemInput) -> MarketResult<Item> {
        let user = ctx.require_active()?;

        let mut v = Validator::new();
        let name = v.check("name", ItemName::new(input.name));
        let phone_no = v.check("phone_no", PhoneNo::new(input.phone_no));
        let instruction = v.check(
            "instruction",
            MessageText::optional(input.instruction.unwrap_or_default()),
        );
        if self.repo.find_location(&input.location_id).await?.is_none() {
            v.reject("location_id", UNKNOWN_LOCATION);
        }

        let (Some(name), Some(phone_no), Some(instruction)) = (name, phone_no, instruction) else {
            return Err(MarketError::Validation(v.into_errors()));
        };
        if v.has_errors() {
            return Err(MarketError::Validation(v.into_errors()));
        }

        let owner = ItemOwner {
            user_id: user.user_id,
            display_name: user.display_name.clone(),
            email: user.email.clone().unwrap_or_default(),
        };
        let item = self
            .repo
            .create_item(&NewItem::new(owner, name, phone_no, input.location_id, instruction))
            .await?;

        tracing::info!(item_id = %item.item_id, owner = %item.owner.user_id, "Item created");

        Ok(item)
    }

    pub async fn get(&self, item_id: &ItemId) -> MarketResult<ItemDetail> {
        let item = self
            .repo
            .find_item(item_id)
            .await?
            .ok_or(MarketError::ItemNotFound)?;

        let comments = match self.threads.get_item_comments(item_id).await {
            Ok(comments) => Some(comments),
            Err(e) => {
                tracing::warn!(error = %e, %item_id, "Serving item without comments");
                None
            }
        };

        Ok(ItemDetail { item, comments })
    }

    /// Owner-only; closed items are frozen
    pub async fn update(
        &self,
        ctx: &AuthContext,
        item_id: &ItemId,
        input: UpdateItemInput,
    ) -> MarketResult<Item> {
        let user = ctx.require_active()?;
        let item = self.owned_item(item_id, user).await?;
        item.ensure_open()?;

        let mut v = Validator::new();
        let changes = ItemChanges {
            name: input.name.and_then(|n| v.check("name", ItemName::new(n))),
            phone_no: input.phone_no.and_then(|p| v.check("phone_no", PhoneNo::new(p))),
            location_id: input.location_id,
            instruction: input
                .instruction
                .and_then(|i| v.check("instruction", MessageText::optional(i))),
        };
        if let Some(location_id) = &changes.location_id {
            if self.repo.find_location(location_id).await?.is_none() {
                v.reject("location_id", UNKNOWN_LOCATION);
            }
        }
        if !v.has_errors() && changes.is_empty() {
            v.reject("item", "Please supply at least one field to update");
        }
        if v.has_errors() {
            return Err(MarketError::Validation(v.into_errors()));
        }

        let item = self
            .repo
            .update_item(item_id, &changes)
            .await?
            .ok_or(MarketError::ItemNotFound)?;

        tracing::info!(%item_id, "Item updated");

        Ok(item)
    }

    /// Owner-only. Closing a closed item is a no-op.
    pub async fn close(&self, ctx: &AuthContext, item_id: &ItemId) -> MarketResult<Item> {
        let user = ctx.require_active()?;
        let item = self.owned_item(item_id, user).await?;
        if item.closed {
            return Ok(item);
        }

        let item = self
            .repo
            .close_item(item_id)
            .await?
            .ok_or(MarketError::ItemNotFound)?;

        tracing::info!(%item_id, "Item closed");

        Ok(item)
    }

    async fn owned_item(&self, item_id: &ItemId, user: &auth::SessionUser) -> MarketResult<Item> {
        let item = self
            .repo
            .find_item(item_id)
            .await?
            .ok_or(MarketError::ItemNotFound)?;
        if !item.is_owned_by(&user.user_id) {
            return Err(MarketError::NotOwner);
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::Fixture;
    use auth::AuthError;

    fn input(location_id: LocationId) -> CreateItemInput {
        CreateItemInput {
            name: "Lawn mower".into(),
            phone_no: "+234 803 000 0000".into(),
            location_id,
            instruction: Some("Pick up only".into()),
        }
    }

    #[tokio::test]
    async fn test_create_resolves_owner_and_location() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);

        let item = fx.items().create(&ada, input(fx.location_id)).await.unwrap();

        assert_eq!(item.owner.display_name, "ada");
        assert_eq!(item.owner.email, "ada@example.com");
        assert_eq!(item.location.city.as_str(), "LAGOS");
        assert!(!item.closed);
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_list() {
        let fx = Fixture::new().await;
        let err = fx
            .items()
            .create(&fx.user("ada", false), input(fx.location_id))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Auth(AuthError::AccountInactive)));
    }

    #[tokio::test]
    async fn test_create_validates_every_field() {
        let fx = Fixture::new().await;
        let err = fx
            .items()
            .create(
                &fx.user("ada", true),
                CreateItemInput {
                    name: "ab".into(),
                    phone_no: "12".into(),
                    location_id: LocationId::new(),
                    instruction: None,
                },
            )
            .await
            .unwrap_err();

        let MarketError::Validation(fields) = err else {
            panic!("expected validation error, got {err:?}");
        };
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["location_id", "name", "phone_no"]);
    }

    #[tokio::test]
    async fn test_get_distinguishes_unavailable_from_empty_comments() {
        let fx = Fixture::new().await;
        let item = fx.items().create(&fx.user("ada", true), input(fx.location_id)).await.unwrap();

        let detail = fx.items().get(&item.item_id).await.unwrap();
        assert_eq!(detail.comments.map(|c| c.len()), Some(0));

        fx.kv.fail_after(0);
        let detail = fx.items().get(&item.item_id).await.unwrap();
        assert!(detail.comments.is_none());

        assert!(matches!(
            fx.items().get(&ItemId::new()).await,
            Err(MarketError::ItemNotFound)
        ));
    }

    #[tokio::test]
    async fn test_only_owner_edits_open_items() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        let bob = fx.user("bob", true);
        let item = fx.items().create(&ada, input(fx.location_id)).await.unwrap();
        let rename = || UpdateItemInput {
            name: Some("Hedge trimmer".into()),
            ..Default::default()
        };

        assert!(matches!(
            fx.items().update(&bob, &item.item_id, rename()).await,
            Err(MarketError::NotOwner)
        ));

        let updated = fx.items().update(&ada, &item.item_id, rename()).await.unwrap();
        assert_eq!(updated.name.as_str(), "Hedge trimmer");
        assert_eq!(updated.phone_no, item.phone_no);

        assert!(matches!(
            fx.items().close(&bob, &item.item_id).await,
            Err(MarketError::NotOwner)
        ));
        assert!(fx.items().close(&ada, &item.item_id).await.unwrap().closed);
        assert!(fx.items().close(&ada, &item.item_id).await.unwrap().closed);

        assert!(matches!(
            fx.items().update(&ada, &item.item_id, rename()).await,
            Err(MarketError::ItemClosed)
        ));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        let item = fx.items().create(&ada, input(fx.location_id)).await.unwrap();

        assert!(matches!(
            fx.items().update(&ada, &item.item_id, UpdateItemInput::default()).await,
            Err(MarketError::Validation(_))
        ));
    }
}
