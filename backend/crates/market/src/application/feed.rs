//! Live item feeds
//!
//! Pushes a snapshot of open listings to one subscriber on a fixed interval
//! until the subscriber leaves or a push fails. The sink is closed exactly
//! once, whichever way the loop ends.

use std::sync::Arc;
use std::time::Duration;

use kernel::id::LocationId;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::entity::item::Item;
use crate::domain::repository::SharedMarketRepository;
use crate::error::MarketResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    All,
    Location(LocationId),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to encode feed snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("subscriber disconnected")]
    Disconnected,
}

/// Where snapshots go, e.g. a WebSocket
#[trait_variant::make(FeedSink: Send)]
pub trait LocalFeedSink {
    async fn push(&mut self, items: &[Item]) -> Result<(), FeedError>;

    async fn close(&mut self);
}

/// Why a feed stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEnd {
    Cancelled,
    FetchFailed,
    PushFailed,
}

pub struct LiveFeed<R> {
    repo: Arc<R>,
    interval: Duration,
}

impl<R> Clone for LiveFeed<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            interval: self.interval,
        }
    }
}

impl<R: SharedMarketRepository> LiveFeed<R> {
    pub fn new(repo: Arc<R>, interval: Duration) -> Self {
        Self { repo, interval }
    }

    async fn snapshot(&self, scope: FeedScope) -> MarketResult<Vec<Item>> {
        match scope {
            FeedScope::All => self.repo.list_open_items().await,
            FeedScope::Location(location_id) => self.repo.list_open_items_in(&location_id).await,
        }
    }

    /// First snapshot goes out immediately. Ticks missed while a push is
    /// in flight are skipped rather than bunched up.
    pub async fn run<S>(&self, scope: FeedScope, mut sink: S, cancel: CancellationToken) -> FeedEnd
    where
        S: FeedSink + Send,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let end = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break FeedEnd::Cancelled,
                _ = ticker.tick() => {}
            }

            let items = match self.snapshot(scope).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(error = %e, ?scope, "Live feed query failed");
                    break FeedEnd::FetchFailed;
                }
            };

            if let Err(e) = sink.push(&items).await {
                tracing::debug!(error = %e, ?scope, "Live feed push failed");
                break FeedEnd::PushFailed;
            }
        };

        sink.close().await;
        tracing::debug!(?scope, ?end, "Live feed ended");

        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::Fixture;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(120);

    #[derive(Clone, Default)]
    struct RecordingSink {
        pushes: Arc<Mutex<Vec<Vec<String>>>>,
        closed: Arc<AtomicUsize>,
        fail_on_push: Option<usize>,
    }

    impl RecordingSink {
        fn pushes(&self) -> Vec<Vec<String>> {
            self.pushes.lock().unwrap().clone()
        }
    }

    impl FeedSink for RecordingSink {
        async fn push(&mut self, items: &[Item]) -> Result<(), FeedError> {
            let mut pushes = self.pushes.lock().unwrap();
            if self.fail_on_push == Some(pushes.len()) {
                return Err(FeedError::Disconnected);
            }
            pushes.push(items.iter().map(|i| i.name.as_str().to_string()).collect());
            Ok(())
        }

        async fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pushes_on_every_tick_until_cancelled() {
        let fx = Fixture::new().await;
        fx.listing(&fx.user("ada", true)).await;
        let feed = LiveFeed::new(fx.repo.clone(), INTERVAL);
        let sink = RecordingSink::default();
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let (sink, cancel) = (sink.clone(), cancel.clone());
            async move { feed.run(FeedScope::All, sink, cancel).await }
        });

        tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), FeedEnd::Cancelled);
        assert_eq!(sink.pushes().len(), 3);
        assert_eq!(sink.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_failure_ends_the_feed() {
        let fx = Fixture::new().await;
        let feed = LiveFeed::new(fx.repo.clone(), INTERVAL);
        let sink = RecordingSink {
            fail_on_push: Some(1),
            ..Default::default()
        };

        let end = feed
            .run(FeedScope::All, sink.clone(), CancellationToken::new())
            .await;

        assert_eq!(end, FeedEnd::PushFailed);
        assert_eq!(sink.pushes().len(), 1);
        assert_eq!(sink.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_scope_filters_listings() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        fx.listing(&ada).await;
        let elsewhere = fx.location("Kano").await;
        fx.listing_in(&ada, "Bicycle", elsewhere).await;

        let feed = LiveFeed::new(fx.repo.clone(), INTERVAL);
        let sink = RecordingSink {
            fail_on_push: Some(1),
            ..Default::default()
        };
        feed.run(FeedScope::Location(elsewhere), sink.clone(), CancellationToken::new())
            .await;

        assert_eq!(sink.pushes(), vec![vec!["Bicycle".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_items_leave_the_feed() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        let item = fx.listing(&ada).await;
        fx.items().close(&ada, &item.item_id).await.unwrap();

        let feed = LiveFeed::new(fx.repo.clone(), INTERVAL);
        let sink = RecordingSink {
            fail_on_push: Some(1),
            ..Default::default()
        };
        feed.run(FeedScope::All, sink.clone(), CancellationToken::new()).await;

        assert_eq!(sink.pushes(), vec![Vec::<String>::new()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_feed_closes_without_pushing() {
        let fx = Fixture::new().await;
        let feed = LiveFeed::new(fx.repo.clone(), INTERVAL);
        let sink = RecordingSink::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(feed.run(FeedScope::All, sink.clone(), cancel).await, FeedEnd::Cancelled);
        assert!(sink.pushes().is_empty());
        assert_eq!(sink.closed.load(Ordering::SeqCst), 1);
    }
}
