//! Bid Ledger
//!
//! `bids:{item_id}` hash of bidder display name to bid message. A bidder
//! holds one bid per item; bidding again replaces it.

use std::collections::BTreeMap;

use kernel::id::ItemId;
use platform::kv::SharedKv;

use crate::domain::value_object::message_text::MessageText;
use crate::error::MarketResult;

fn bids_key(item_id: &ItemId) -> String {
    format!("bids:{item_id}")
}

#[derive(Clone)]
pub struct BidLedger<K> {
    kv: K,
}

impl<K: SharedKv> BidLedger<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Record or replace the bidder's bid. Whether the item is still open
    /// is the caller's check.
    pub async fn place_bid(
        &self,
        item_id: &ItemId,
        bidder: &str,
        message: &MessageText,
    ) -> MarketResult<()> {
        self.kv
            .hash_set(&bids_key(item_id), bidder, message.as_str())
            .await?;
        Ok(())
    }

    /// Bidder to message, ordered by bidder
    pub async fn get_bids(&self, item_id: &ItemId) -> MarketResult<BTreeMap<String, String>> {
        let bids = self.kv.hash_get_all(&bids_key(item_id)).await?;
        Ok(bids.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::kv::MemoryKv;

    #[tokio::test]
    async fn test_last_bid_per_bidder_wins() {
        let ledger = BidLedger::new(MemoryKv::new());
        let item_id = ItemId::new();

        ledger.place_bid(&item_id, "bob", &MessageText::new("20 naira").unwrap()).await.unwrap();
        ledger.place_bid(&item_id, "eve", &MessageText::new("25 naira").unwrap()).await.unwrap();
        ledger.place_bid(&item_id, "bob", &MessageText::new("30 naira").unwrap()).await.unwrap();

        let bids = ledger.get_bids(&item_id).await.unwrap();
        assert_eq!(bids.len(), 2);
        assert_eq!(bids["bob"], "30 naira");
        assert_eq!(bids["eve"], "25 naira");
    }

    #[tokio::test]
    async fn test_no_bids_is_empty() {
        let ledger = BidLedger::new(MemoryKv::new());
        assert!(ledger.get_bids(&ItemId::new()).await.unwrap().is_empty());
    }
}
