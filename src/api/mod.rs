//! HTTP API handlers for prodstats

pub mod cache;
pub mod error;
pub mod health;
pub mod index;
pub mod stats;

pub use cache::{cache_info, clear_cache};
pub use error::ApiError;
pub use health::health_routes;
pub use index::index;
pub use stats::{
    category_distribution, category_stats, global_stats, high_variability, low_variability,
    z_score_outliers,
};
