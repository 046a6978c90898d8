//! prodstats - product catalog rating analytics service
//!
//! Serves descriptive statistics (per-category mean, population standard
//! deviation and variance, z-score outlier detection) over an embedded
//! SQLite store loaded from the catalog CSV.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use prodstats::config::{Args, StorageConfig};
use prodstats::db::{CachedRemoteSource, DataManager};
use prodstats::{build_router, queries, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting prodstats v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = StorageConfig::resolve(&args);
    config.ensure_data_dir();
    if config.restricted_env {
        info!("Restricted execution environment detected");
    }

    let source = CachedRemoteSource::new(&config);
    let manager = Arc::new(DataManager::new(config, Box::new(source)));
    manager.initialize().await?;

    // Startup data-quality summary; observability only.
    let pool = manager.pool().await?;
    match queries::data_quality(&pool).await {
        Ok(quality) => info!(
            "Data quality: {} rows, {} valid, {} null ratings, {} null categories, {} categories",
            quality.total_rows,
            quality.valid_rows,
            quality.null_stars,
            quality.null_categories,
            quality.unique_categories
        ),
        Err(e) => warn!("Data quality check failed: {}", e),
    }

    let state = AppState::new(manager);
    let app = build_router(state).layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("prodstats listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
