use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use shopguide_api::auth::TokenCodec;
use shopguide_api::config;
use shopguide_api::middleware::RateLimiter;
use shopguide_api::principal::PgPrincipalStore;
use shopguide_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Shopguide API in {:?} mode", config.environment);

    // Fail fast on a weak signing secret; this must never surface as a
    // per-request error
    let codec = TokenCodec::new(
        &config.jwt.secret,
        config.jwt.access_ttl_minutes,
        config.jwt.refresh_ttl_days,
    )
    .context("invalid SECURITY_JWT_SECRET")?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to database")?;

    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

    // Periodic sweep so abandoned rate-limit keys do not accumulate forever
    let sweeper = Arc::clone(&limiter);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            sweeper.sweep_expired();
        }
    });

    let state = AppState {
        codec: Arc::new(codec),
        principals: Arc::new(PgPrincipalStore::new(pool)),
        limiter,
        security: config.security.clone(),
    };

    let app = shopguide_api::app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Shopguide API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
