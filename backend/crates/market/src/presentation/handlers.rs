//! HTTP Handlers

use std::sync::Arc;

use auth::{AuthContext, AuthGate};
use auth::presentation::dto::MessageResponse;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::extract::{ApiJson, ApiQuery};
use kernel::id::{CommentId, ItemId, LocationId, ReplyId};
use platform::kv::SharedKv;
use platform::mail::{Notifier, SharedMailer};
use tokio_util::sync::CancellationToken;

use crate::application::{
    BidUseCase, CommentUseCase, ItemUseCase, LiveFeed, LocationUseCase, MarketConfig,
};
use crate::domain::repository::SharedMarketRepository;
use crate::error::MarketResult;
use crate::infra::{BidLedger, ThreadStore};
use crate::presentation::dto::{
    BidRequest, BidsResponse, CommentResponse, CreateCommentRequest, CreateItemRequest,
    CreateLocationRequest, IdQuery, ItemDetailResponse, ItemResponse, LocationResponse,
    ReplyRequest, ReplyResponse, UpdateCommentRequest, UpdateItemRequest, UpdateLocationRequest,
};

/// Shared state for marketplace handlers
pub struct MarketAppState<R, K, M> {
    pub repo: Arc<R>,
    pub threads: ThreadStore<K>,
    pub bids: BidLedger<K>,
    pub notifier: Notifier<M>,
    pub config: Arc<MarketConfig>,
    /// Protects write routes; shares the session cache of the auth routes
    pub gate: AuthGate<K>,
    /// Tripped on server shutdown to end every live feed
    pub shutdown: CancellationToken,
}

impl<R, K: Clone, M> Clone for MarketAppState<R, K, M> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            threads: self.threads.clone(),
            bids: self.bids.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
            gate: self.gate.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<R, K, M> MarketAppState<R, K, M>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    pub fn new(repo: R, kv: K, mailer: M, config: MarketConfig, gate: AuthGate<K>) -> Self {
        Self {
            repo: Arc::new(repo),
            threads: ThreadStore::new(kv.clone()),
            bids: BidLedger::new(kv),
            notifier: Notifier::new(mailer),
            config: Arc::new(config),
            gate,
            shutdown: CancellationToken::new(),
        }
    }

    /// End live feeds when `token` is cancelled
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub(crate) fn items(&self) -> ItemUseCase<R, K> {
        ItemUseCase::new(self.repo.clone(), self.threads.clone())
    }

    pub(crate) fn bid_use_case(&self) -> BidUseCase<R, K, M> {
        BidUseCase::new(
            self.repo.clone(),
            self.bids.clone(),
            self.notifier.clone(),
            self.config.clone(),
        )
    }

    pub(crate) fn comments(&self) -> CommentUseCase<R, K> {
        CommentUseCase::new(self.repo.clone(), self.threads.clone())
    }

    pub(crate) fn locations(&self) -> LocationUseCase<R> {
        LocationUseCase::new(self.repo.clone())
    }

    pub(crate) fn live_feed(&self) -> LiveFeed<R> {
        LiveFeed::new(self.repo.clone(), self.config.feed_interval)
    }
}

// ============================================================================
// Items
// ============================================================================

/// POST /api/items
pub async fn create_item<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiJson(req): ApiJson<CreateItemRequest>,
) -> MarketResult<impl IntoResponse>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let item = state.items().create(&ctx, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// GET /api/items?id=
pub async fn get_item<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ApiQuery(query): ApiQuery<IdQuery<ItemId>>,
) -> MarketResult<Json<ItemDetailResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let detail = state.items().get(&query.id).await?;
    Ok(Json(detail.into()))
}

/// PUT /api/items?id=
pub async fn update_item<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery<ItemId>>,
    ApiJson(req): ApiJson<UpdateItemRequest>,
) -> MarketResult<Json<ItemResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let item = state.items().update(&ctx, &query.id, req.into()).await?;
    Ok(Json(item.into()))
}

/// PATCH /api/items?id=
pub async fn close_item<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery<ItemId>>,
) -> MarketResult<Json<ItemResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let item = state.items().close(&ctx, &query.id).await?;
    Ok(Json(item.into()))
}

// ============================================================================
// Bids
// ============================================================================

/// POST /api/items/bid?id=
pub async fn place_bid<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery<ItemId>>,
    ApiJson(req): ApiJson<BidRequest>,
) -> MarketResult<Json<MessageResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    state
        .bid_use_case()
        .place(&ctx, &query.id, req.message)
        .await?;
    Ok(Json(MessageResponse::new("Bid placed successfully")))
}

/// GET /api/items/bid?id=
pub async fn get_bids<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery<ItemId>>,
) -> MarketResult<Json<BidsResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let bids = state.bid_use_case().list(&ctx, &query.id).await?;
    Ok(Json(BidsResponse { bids }))
}

// ============================================================================
// Comments
// ============================================================================

/// POST /api/comments
pub async fn create_comment<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> MarketResult<impl IntoResponse>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let comment = state
        .comments()
        .create(&ctx, &req.item_id, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// GET /api/comments?id=
pub async fn get_comment<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ApiQuery(query): ApiQuery<IdQuery<CommentId>>,
) -> MarketResult<Json<CommentResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let thread = state.comments().get(&query.id).await?;
    Ok(Json(thread.into()))
}

/// GET /api/comments/item?id=
pub async fn item_comments<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ApiQuery(query): ApiQuery<IdQuery<ItemId>>,
) -> MarketResult<Json<Vec<CommentResponse>>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let comments = state.comments().item_comments(&query.id).await?;
    Ok(Json(comments.into_iter().map(Into::into).collect()))
}

/// PUT /api/comments?id=
pub async fn update_comment<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery<CommentId>>,
    ApiJson(req): ApiJson<UpdateCommentRequest>,
) -> MarketResult<Json<CommentResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let comment = state
        .comments()
        .update(&ctx, &query.id, req.comment)
        .await?;
    Ok(Json(comment.into()))
}

/// DELETE /api/comments?id=
pub async fn delete_comment<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery<CommentId>>,
) -> MarketResult<Json<MessageResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    state.comments().delete(&ctx, &query.id).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

// ============================================================================
// Replies
// ============================================================================

/// GET /api/comments/{comment_id}/reply
pub async fn list_replies<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    Path(comment_id): Path<CommentId>,
) -> MarketResult<Json<Vec<ReplyResponse>>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let replies = state.comments().replies(&comment_id).await?;
    Ok(Json(replies.into_iter().map(Into::into).collect()))
}

/// POST /api/comments/{comment_id}/reply
pub async fn create_reply<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    Path(comment_id): Path<CommentId>,
    ApiJson(req): ApiJson<ReplyRequest>,
) -> MarketResult<impl IntoResponse>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let reply = state
        .comments()
        .create_reply(&ctx, &comment_id, req.reply)
        .await?;
    Ok((StatusCode::CREATED, Json(ReplyResponse::from(reply))))
}

/// PUT /api/comments/{comment_id}/reply?id=
pub async fn update_reply<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    Path(comment_id): Path<CommentId>,
    ApiQuery(query): ApiQuery<IdQuery<ReplyId>>,
    ApiJson(req): ApiJson<ReplyRequest>,
) -> MarketResult<Json<ReplyResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let reply = state
        .comments()
        .update_reply(&ctx, &comment_id, &query.id, req.reply)
        .await?;
    Ok(Json(reply.into()))
}

/// DELETE /api/comments/{comment_id}/reply?id=
pub async fn delete_reply<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    Path(comment_id): Path<CommentId>,
    ApiQuery(query): ApiQuery<IdQuery<ReplyId>>,
) -> MarketResult<Json<MessageResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    state
        .comments()
        .delete_reply(&ctx, &comment_id, &query.id)
        .await?;
    Ok(Json(MessageResponse::new("Reply deleted successfully")))
}

// ============================================================================
// Locations
// ============================================================================

/// POST /api/locations
pub async fn create_location<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiJson(req): ApiJson<CreateLocationRequest>,
) -> MarketResult<impl IntoResponse>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let location = state.locations().create(&ctx, req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(LocationResponse::with_owner(&location)),
    ))
}

/// GET /api/locations
pub async fn list_locations<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
) -> MarketResult<Json<Vec<LocationResponse>>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let locations = state.locations().list().await?;
    Ok(Json(locations.iter().map(LocationResponse::public).collect()))
}

/// GET /api/locations/location?id=
pub async fn get_location<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ApiQuery(query): ApiQuery<IdQuery<LocationId>>,
) -> MarketResult<Json<LocationResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let location = state.locations().get(&query.id).await?;
    Ok(Json(LocationResponse::public(&location)))
}

/// PUT /api/locations?id=
pub async fn update_location<R, K, M>(
    State(state): State<MarketAppState<R, K, M>>,
    ctx: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery<LocationId>>,
    ApiJson(req): ApiJson<UpdateLocationRequest>,
) -> MarketResult<Json<LocationResponse>>
where
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let location = state
        .locations()
        .update(&ctx, &query.id, req.into())
        .await?;
    Ok(Json(LocationResponse::with_owner(&location)))
}
