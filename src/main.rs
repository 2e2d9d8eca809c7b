use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use affinity_engine::{
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, ApiQuota, PgArtistStore},
    routes::{create_router, AppState},
    services::{RecommendationEngine, SpotifyProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "affinity_engine=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let redis_client = create_redis_client(&config.redis_url)?;
    let quota = ApiQuota::new(redis_client, "spotify", config.spotify_monthly_quota);
    let source = SpotifyProvider::new(config.spotify_api_url.clone(), Some(quota));

    let state = AppState::new(
        Arc::new(PgArtistStore::new(pool)),
        Arc::new(source),
        RecommendationEngine::from_config(&config),
    );
    let app = create_router(Arc::new(state));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        expansion_depth = config.expansion_depth,
        max_concurrent_fetches = config.max_concurrent_fetches,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
