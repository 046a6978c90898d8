//! prodstats library - product catalog rating analytics service
//!
//! Read-only statistical query API over a catalog table loaded from CSV
//! into embedded SQLite, with transparent fallback between persistent and
//! in-memory storage.

use axum::Router;
use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queries;

use db::DataManager;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Storage and connection lifecycle manager; the only mutable
    /// process-wide state in the service
    pub manager: Arc<DataManager>,
}

impl AppState {
    pub fn new(manager: Arc<DataManager>) -> Self {
        Self { manager }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/", get(api::index))
        .route("/category-stats", get(api::category_stats))
        .route("/z-score-outliers", get(api::z_score_outliers))
        .route("/high-variability", get(api::high_variability))
        .route("/low-variability", get(api::low_variability))
        .route("/global-stats", get(api::global_stats))
        .route("/category-distribution", get(api::category_distribution))
        .route("/cache-info", get(api::cache_info))
        .route("/clear-cache", post(api::clear_cache))
        .merge(api::health_routes())
        .with_state(state)
}
