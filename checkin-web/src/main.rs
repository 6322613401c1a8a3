//! # Easy CheckIn Web Server
//!
//! Serves the check-in kiosk, the admin pages and the chat assistant.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p checkin-web
//! ```

use checkin_shared::db::{migrations::run_migrations, pool::create_pool};
use checkin_web::{
    app::{build_router, AppState},
    config::Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "checkin_web=debug,checkin_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Easy CheckIn server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(config.pool_config()).await?;
    run_migrations(&pool).await?;

    if config.chat.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; the chat assistant will only explain how to enable it");
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool");
    checkin_shared::db::pool::close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
