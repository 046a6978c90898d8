//! Handlers for the statistical query endpoints
//!
//! Parameter bounds are checked before the connection is acquired, so an
//! invalid request never reaches the engine. Array-shaped views return
//! bare JSON arrays; single-record and mixed views return the generic
//! envelope.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::models::{ApiResponse, CategoryStats, VariabilityCategory, ZScoreOutlier};
use crate::queries;
use crate::AppState;

/// Default z-score threshold when the caller supplies none
pub const DEFAULT_THRESHOLD: f64 = 1.75;

/// Default variability limit when the caller supplies none
pub const DEFAULT_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct OutlierParams {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// GET /category-stats
pub async fn category_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryStats>>, ApiError> {
    let pool = state.manager.pool().await?;
    Ok(Json(queries::category_stats(&pool).await?))
}

/// GET /z-score-outliers
pub async fn z_score_outliers(
    State(state): State<AppState>,
    Query(params): Query<OutlierParams>,
) -> Result<Json<Vec<ZScoreOutlier>>, ApiError> {
    queries::validate_threshold(params.threshold)?;
    let pool = state.manager.pool().await?;
    Ok(Json(queries::z_score_outliers(&pool, params.threshold).await?))
}

/// GET /high-variability
pub async fn high_variability(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<VariabilityCategory>>, ApiError> {
    queries::validate_limit(params.limit)?;
    let pool = state.manager.pool().await?;
    Ok(Json(queries::high_variability(&pool, params.limit).await?))
}

/// GET /low-variability
pub async fn low_variability(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<VariabilityCategory>>, ApiError> {
    queries::validate_limit(params.limit)?;
    let pool = state.manager.pool().await?;
    Ok(Json(queries::low_variability(&pool, params.limit).await?))
}

/// GET /global-stats
pub async fn global_stats(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let pool = state.manager.pool().await?;
    let stats = queries::global_stats(&pool).await?;
    Ok(Json(ApiResponse::ok(
        "Global statistics retrieved successfully",
        json!([stats]),
    )))
}

/// GET /category-distribution
pub async fn category_distribution(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse>, ApiError> {
    let pool = state.manager.pool().await?;
    let distribution = queries::category_distribution(&pool).await?;
    Ok(Json(ApiResponse::ok(
        "Category distribution retrieved successfully",
        json!(distribution),
    )))
}
