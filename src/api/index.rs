//! Service index endpoint

use axum::Json;
use serde_json::json;

use crate::models::ApiResponse;

/// GET /
///
/// Lists the available endpoints.
pub async fn index() -> Json<ApiResponse> {
    Json(ApiResponse::ok(
        "Product catalog rating analytics API",
        json!([
            {
                "endpoints": [
                    "/category-stats",
                    "/z-score-outliers",
                    "/high-variability",
                    "/low-variability",
                    "/global-stats",
                    "/category-distribution",
                    "/cache-info",
                    "/clear-cache",
                    "/health"
                ]
            }
        ]),
    ))
}
