//! Response and record types for the analytics API

use serde::Serialize;

/// Per-category descriptive statistics
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category_name: String,
    pub average_rating: f64,
    pub standard_deviation: f64,
    pub variance: f64,
    pub product_count: i64,
}

/// Category whose mean rating deviates from the cross-category mean
///
/// The z-score is a second-order statistic: the deviation of this category's
/// mean from the mean of all qualifying categories' means, in units of the
/// cross-category standard deviation.
#[derive(Debug, Clone, Serialize)]
pub struct ZScoreOutlier {
    pub category_name: String,
    pub average_rating: f64,
    pub z_score: f64,
    pub global_average: f64,
    pub product_count: i64,
    pub is_high_outlier: bool,
    pub is_low_outlier: bool,
}

/// Per-category rating variability record
#[derive(Debug, Clone, Serialize)]
pub struct VariabilityCategory {
    pub category_name: String,
    pub standard_deviation: f64,
    pub variance: f64,
    pub average_rating: f64,
    pub product_count: i64,
}

/// Whole-dataset statistics over qualifying rows
///
/// Aggregates are null when the table holds no qualifying rows.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub total_products: i64,
    pub total_categories: i64,
    pub global_avg_rating: Option<f64>,
    pub global_stddev: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
}

/// Distribution of products across categories, small categories included
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDistribution {
    pub category_name: String,
    pub product_count: i64,
    pub avg_rating: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
}

/// Null-value and coverage summary of the loaded table
#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    pub total_rows: i64,
    pub valid_rows: i64,
    pub null_stars: i64,
    pub null_categories: i64,
    pub unique_categories: i64,
}

/// Cache artifact metadata and the effective storage mode
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub csv_exists: bool,
    pub db_exists: bool,
    pub csv_size_mb: f64,
    pub db_size_mb: f64,
    pub record_count: i64,
    pub restricted_env: bool,
    pub use_persistent_db: bool,
}

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}
