//! Bid Use Cases

use std::collections::BTreeMap;
use std::sync::Arc;

use auth::AuthContext;
use kernel::id::ItemId;
use platform::kv::SharedKv;
use platform::mail::{Notifier, SharedMailer};

use crate::application::config::MarketConfig;
use crate::application::notification::bid_alert_mail;
use crate::application::validate_field;
use crate::domain::repository::SharedMarketRepository;
use crate::domain::value_object::message_text::MessageText;
use crate::error::{MarketError, MarketResult};
use crate::infra::bid_ledger::BidLedger;

pub struct BidUseCase<R, K, M> {
    repo: Arc<R>,
    ledger: BidLedger<K>,
    notifier: Notifier<M>,
    config: Arc<MarketConfig>,
}

impl<R, K, M> BidUseCase<R, K, M>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    pub fn new(
        repo: Arc<R>,
        ledger: BidLedger<K>,
        notifier: Notifier<M>,
        config: Arc<MarketConfig>,
    ) -> Self {
        Self {
            repo,
            ledger,
            notifier,
            config,
        }
    }

    /// Record the bid under the bidder's display name and alert the seller.
    /// The alert is sent in the background; its failure does not fail the bid.
    pub async fn place(
        &self,
        ctx: &AuthContext,
        item_id: &ItemId,
        message: String,
    ) -> MarketResult<()> {
        let user = ctx.require_active()?;
        let message = validate_field("message", MessageText::new(message))?;

        let item = self
            .repo
            .find_item(item_id)
            .await?
            .ok_or(MarketError::ItemNotFound)?;
        item.ensure_open()?;

        self.ledger
            .place_bid(item_id, &user.display_name, &message)
            .await?;

        tracing::info!(%item_id, bidder = %user.display_name, "Bid placed");

        let link = self.config.item_link(item_id);
        match bid_alert_mail(&item, &user.display_name, &link) {
            Ok(mail) => {
                self.notifier.dispatch(mail);
            }
            Err(e) => tracing::warn!(error = %e, %item_id, "Bid alert not sent"),
        }

        Ok(())
    }

    /// Bids on an item, visible to its owner only
    pub async fn list(
        &self,
        ctx: &AuthContext,
        item_id: &ItemId,
    ) -> MarketResult<BTreeMap<String, String>> {
        let user = ctx.require_active()?;
        let item = self
            .repo
            .find_item(item_id)
            .await?
            .ok_or(MarketError::ItemNotFound)?;
        if !item.is_owned_by(&user.user_id) {
            return Err(MarketError::NotOwner);
        }

        self.ledger.get_bids(item_id).await
    }
}
