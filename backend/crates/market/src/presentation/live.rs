//! Live feed WebSocket endpoints
//!
//! Each subscriber gets its own feed task. A reader task watches the socket
//! and cancels the feed when the client goes away.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use kernel::extract::ApiQuery;
use platform::kv::SharedKv;
use platform::mail::SharedMailer;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::{FeedError, FeedScope, FeedSink, LiveFeed};
use crate::domain::entity::item::Item;
use crate::domain::repository::SharedMarketRepository;
use crate::error::MarketResult;
use crate::presentation::dto::{ItemResponse, LocationIdQuery};
use crate::presentation::handlers::MarketAppState;

/// Writes each snapshot as one JSON text frame
struct SocketSink {
    sender: SplitSink<WebSocket, Message>,
}

impl FeedSink for SocketSink {
    async fn push(&mut self, items: &[Item]) -> Result<(), FeedError> {
        let body: Vec<ItemResponse> = items.iter().map(ItemResponse::from).collect();
        let text = serde_json::to_string(&body)?;
        self.sender
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| FeedError::Disconnected)
    }

    async fn close(&mut self) {
        if let Err(e) = self.sender.close().await {
            tracing::debug!(error = %e, "Live feed socket already closed");
        }
    }
}

/// Drain client frames until the socket closes, then cancel the feed
fn watch_for_close(
    mut receiver: SplitStream<WebSocket>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
        cancel.cancel();
    })
}

async fn serve_feed<R: SharedMarketRepository>(
    socket: WebSocket,
    feed: LiveFeed<R>,
    scope: FeedScope,
    cancel: CancellationToken,
) {
    let (sender, receiver) = socket.split();
    let reader = watch_for_close(receiver, cancel.clone());

    tracing::info!(?scope, "Live feed subscriber connected");
    let end = feed.run(scope, SocketSink { sender }, cancel).await;
    reader.abort();
    tracing::info!(?scope, ?end, "Live feed subscriber disconnected");
}

/// GET /api/items/live
pub async fn live_items<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let feed = state.live_feed();
    let cancel = state.shutdown.child_token();
    ws.on_upgrade(move |socket| serve_feed(socket, feed, FeedScope::All, cancel))
}

/// GET /api/items/location?location_id=
pub async fn location_items<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ApiQuery(query): ApiQuery<LocationIdQuery>,
    ws: WebSocketUpgrade,
) -> MarketResult<impl IntoResponse>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let location = state.locations().get(&query.location_id).await?;
    let scope = FeedScope::Location(location.location_id);
    let feed = state.live_feed();
    let cancel = state.shutdown.child_token();
    Ok(ws.on_upgrade(move |socket| serve_feed(socket, feed, scope, cancel)))
}
