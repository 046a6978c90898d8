//! Cache inspection and management endpoints

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::api::error::ApiError;
use crate::models::ApiResponse;
use crate::AppState;

/// GET /cache-info
pub async fn cache_info(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let info = state.manager.cache_info().await?;
    Ok(Json(ApiResponse::ok(
        "Cache information retrieved successfully",
        json!([info]),
    )))
}

/// POST /clear-cache
///
/// Deletes the cache artifacts and rebuilds the database connection before
/// responding; the rebuild is serialized against in-flight queries.
pub async fn clear_cache(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    state.manager.clear_cache().await?;
    Ok(Json(ApiResponse::ok(
        "Cache cleared successfully",
        json!([{"message": "All cached data has been cleared and the database rebuilt"}]),
    )))
}
