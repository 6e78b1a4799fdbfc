//! API composition root
//!
//! Mounts the account and marketplace routers under `/api` with request
//! tracing and CORS. `main` wires the production backends; tests wire the
//! in-memory ones.

pub mod config;

use auth::AuthAppState;
use auth::domain::repository::SharedUserRepository;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use market::MarketAppState;
use market::domain::repository::SharedMarketRepository;
use platform::kv::SharedKv;
use platform::mail::SharedMailer;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;

/// CORS for the configured frontend origins; unparsable origins are skipped
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}

pub fn build_router<U, R, K, M>(
    auth: AuthAppState<U, K, M>,
    market: MarketAppState<R, K, M>,
    origins: &[String],
) -> Router
where
    U: SharedUserRepository,
    R: SharedMarketRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let api = auth::auth_router(auth).merge(market::market_router(market));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(origins))
}
