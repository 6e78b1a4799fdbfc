//! API Server Entry Point
//!
//! Uses `anyhow` for startup errors; request errors go through the crate
//! error enums and `kernel::error::AppError`.

use std::net::SocketAddr;

use api::{ApiConfig, build_router};
use auth::{AuthAppState, PgUserRepository};
use market::{MarketAppState, PgMarketRepository};
use platform::kv::RedisKv;
use platform::mail::{ConfiguredMailer, HttpMailer, LogMailer};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,market=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let kv = RedisKv::connect(&config.redis_url).await?;

    let mailer = match &config.mail {
        Some(relay) => {
            tracing::info!(url = %relay.url, "Mail relay configured");
            ConfiguredMailer::Relay(HttpMailer::new(
                reqwest::Client::new(),
                relay.url.clone(),
                relay.username.clone(),
                relay.password.clone(),
                relay.from.clone(),
            ))
        }
        None => {
            tracing::warn!("MAIL_API_URL not set, outgoing mail will only be logged");
            ConfiguredMailer::Log(LogMailer)
        }
    };

    // Live feeds end when the server shuts down
    let shutdown = CancellationToken::new();

    let auth_state = AuthAppState::new(
        PgUserRepository::new(pool.clone()),
        kv.clone(),
        mailer.clone(),
        config.auth.clone(),
    );
    let market_state = MarketAppState::new(
        PgMarketRepository::new(pool),
        kv,
        mailer,
        config.market.clone(),
        auth_state.gate(),
    )
    .with_shutdown(shutdown.clone());

    let app = build_router(auth_state, market_state, &config.frontend_origins);

    // Start server
    tracing::info!("Listening on {}", config.listen_addr);

    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
    shutdown.cancel();
}
