//! Analytical queries over the products table
//!
//! Every operation shares the exclusion predicate (non-null rating and
//! non-null category) and re-raises engine failures as a uniform
//! `Error::Query` carrying the engine's message. SQLite ships no
//! STDDEV/VAR_POP aggregates, so population variance is computed in SQL as
//! `AVG(x*x) - AVG(x)*AVG(x)` and the square root is taken here; both
//! statistics are population (divisor N) by construction.

use crate::error::{Error, Result};
use crate::models::{
    CategoryDistribution, CategoryStats, DataQuality, GlobalStats, VariabilityCategory,
    ZScoreOutlier,
};
use sqlx::SqlitePool;

/// Minimum qualifying products for a category to appear in per-category views
pub const MIN_CATEGORY_PRODUCTS: i64 = 10;

/// Inclusive bounds for the z-score threshold parameter
pub const THRESHOLD_RANGE: (f64, f64) = (0.0, 5.0);

/// Inclusive bounds for the variability limit parameter
pub const LIMIT_RANGE: (i64, i64) = (1, 100);

/// Per-category aggregate core shared by the stats and variability views.
/// The variance term can dip epsilon-negative from float cancellation.
const CATEGORY_AGGREGATE_SQL: &str = "
    SELECT category_name,
           AVG(stars) AS average_rating,
           AVG(stars * stars) - AVG(stars) * AVG(stars) AS variance,
           COUNT(*) AS product_count
    FROM products
    WHERE stars IS NOT NULL AND category_name IS NOT NULL
    GROUP BY category_name
    HAVING COUNT(*) >= ?
";

fn query_err(e: sqlx::Error) -> Error {
    Error::Query(e.to_string())
}

/// Reject a z-score threshold outside the supported range
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if (THRESHOLD_RANGE.0..=THRESHOLD_RANGE.1).contains(&threshold) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "threshold must be between {} and {}, got {}",
            THRESHOLD_RANGE.0, THRESHOLD_RANGE.1, threshold
        )))
    }
}

/// Reject a variability limit outside the supported range
pub fn validate_limit(limit: i64) -> Result<()> {
    if (LIMIT_RANGE.0..=LIMIT_RANGE.1).contains(&limit) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "limit must be between {} and {}, got {}",
            LIMIT_RANGE.0, LIMIT_RANGE.1, limit
        )))
    }
}

/// Count, mean, population stddev, and population variance per qualifying
/// category, ordered by mean rating descending.
pub async fn category_stats(pool: &SqlitePool) -> Result<Vec<CategoryStats>> {
    let sql = format!("{CATEGORY_AGGREGATE_SQL} ORDER BY average_rating DESC");
    let rows: Vec<(String, f64, f64, i64)> = sqlx::query_as(&sql)
        .bind(MIN_CATEGORY_PRODUCTS)
        .fetch_all(pool)
        .await
        .map_err(query_err)?;

    Ok(rows
        .into_iter()
        .map(|(category_name, average_rating, variance, product_count)| {
            let variance = variance.max(0.0);
            CategoryStats {
                category_name,
                average_rating,
                standard_deviation: variance.sqrt(),
                variance,
                product_count,
            }
        })
        .collect())
}

/// Categories whose mean rating deviates from the cross-category mean by at
/// least `threshold` standard deviations of the category-mean distribution,
/// ordered by |z| descending.
///
/// The normalization is two-level: per-category means first, then mean and
/// population stddev over that distribution of means. A zero (or
/// non-finite) cross-category stddev makes z undefined, which is treated
/// as "no outliers" rather than letting NaN/Inf reach the response.
pub async fn z_score_outliers(pool: &SqlitePool, threshold: f64) -> Result<Vec<ZScoreOutlier>> {
    validate_threshold(threshold)?;

    let rows: Vec<(String, f64, i64)> = sqlx::query_as(
        "
        SELECT category_name,
               AVG(stars) AS average_rating,
               COUNT(*) AS product_count
        FROM products
        WHERE stars IS NOT NULL AND category_name IS NOT NULL
        GROUP BY category_name
        HAVING COUNT(*) >= ?
        ",
    )
    .bind(MIN_CATEGORY_PRODUCTS)
    .fetch_all(pool)
    .await
    .map_err(query_err)?;

    let means: Vec<f64> = rows.iter().map(|&(_, mean, _)| mean).collect();
    let Some(cross_mean) = mean(&means) else {
        return Ok(Vec::new());
    };
    let cross_stddev = population_stddev(&means, cross_mean);
    if cross_stddev == 0.0 || !cross_stddev.is_finite() {
        return Ok(Vec::new());
    }

    let mut outliers: Vec<ZScoreOutlier> = rows
        .into_iter()
        .filter_map(|(category_name, average_rating, product_count)| {
            let z = (average_rating - cross_mean) / cross_stddev;
            (z.abs() >= threshold).then(|| ZScoreOutlier {
                category_name,
                average_rating,
                z_score: z,
                global_average: cross_mean,
                product_count,
                is_high_outlier: z > threshold,
                is_low_outlier: z < -threshold,
            })
        })
        .collect();
    outliers.sort_by(|a, b| b.z_score.abs().total_cmp(&a.z_score.abs()));
    Ok(outliers)
}

/// Qualifying categories with the highest rating variability
pub async fn high_variability(pool: &SqlitePool, limit: i64) -> Result<Vec<VariabilityCategory>> {
    variability(pool, limit, "DESC", "ASC").await
}

/// Qualifying categories with the lowest rating variability
pub async fn low_variability(pool: &SqlitePool, limit: i64) -> Result<Vec<VariabilityCategory>> {
    variability(pool, limit, "ASC", "DESC").await
}

/// Ordering by variance is ordering by standard deviation; the opposed
/// name tiebreak makes the two directions exact reverses of each other.
async fn variability(
    pool: &SqlitePool,
    limit: i64,
    order: &str,
    tiebreak: &str,
) -> Result<Vec<VariabilityCategory>> {
    validate_limit(limit)?;

    let sql = format!(
        "{CATEGORY_AGGREGATE_SQL} ORDER BY variance {order}, category_name {tiebreak} LIMIT ?"
    );
    let rows: Vec<(String, f64, f64, i64)> = sqlx::query_as(&sql)
        .bind(MIN_CATEGORY_PRODUCTS)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(query_err)?;

    Ok(rows
        .into_iter()
        .map(|(category_name, average_rating, variance, product_count)| {
            let variance = variance.max(0.0);
            VariabilityCategory {
                category_name,
                standard_deviation: variance.sqrt(),
                variance,
                average_rating,
                product_count,
            }
        })
        .collect())
}

/// Whole-dataset statistics over qualifying rows
pub async fn global_stats(pool: &SqlitePool) -> Result<GlobalStats> {
    let row: (i64, i64, Option<f64>, Option<f64>, Option<f64>, Option<f64>) = sqlx::query_as(
        "
        SELECT COUNT(*),
               COUNT(DISTINCT category_name),
               AVG(stars),
               AVG(stars * stars) - AVG(stars) * AVG(stars),
               MIN(stars),
               MAX(stars)
        FROM products
        WHERE stars IS NOT NULL AND category_name IS NOT NULL
        ",
    )
    .fetch_one(pool)
    .await
    .map_err(query_err)?;

    Ok(GlobalStats {
        total_products: row.0,
        total_categories: row.1,
        global_avg_rating: row.2,
        global_stddev: row.3.map(|v| v.max(0.0).sqrt()),
        min_rating: row.4,
        max_rating: row.5,
    })
}

/// Product counts and rating ranges per category, small categories
/// included, ordered by count descending.
pub async fn category_distribution(pool: &SqlitePool) -> Result<Vec<CategoryDistribution>> {
    let rows: Vec<(String, i64, Option<f64>, Option<f64>, Option<f64>)> = sqlx::query_as(
        "
        SELECT category_name,
               COUNT(*) AS product_count,
               AVG(stars),
               MIN(stars),
               MAX(stars)
        FROM products
        WHERE category_name IS NOT NULL
        GROUP BY category_name
        ORDER BY product_count DESC, category_name ASC
        ",
    )
    .fetch_all(pool)
    .await
    .map_err(query_err)?;

    Ok(rows
        .into_iter()
        .map(
            |(category_name, product_count, avg_rating, min_rating, max_rating)| {
                CategoryDistribution {
                    category_name,
                    product_count,
                    avg_rating,
                    min_rating,
                    max_rating,
                }
            },
        )
        .collect())
}

/// Null-value and coverage summary of the loaded table
pub async fn data_quality(pool: &SqlitePool) -> Result<DataQuality> {
    let row: (i64, i64, i64, i64, i64) = sqlx::query_as(
        "
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN stars IS NULL THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN category_name IS NULL THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN stars IS NOT NULL AND category_name IS NOT NULL
                                 THEN 1 ELSE 0 END), 0),
               COUNT(DISTINCT category_name)
        FROM products
        ",
    )
    .fetch_one(pool)
    .await
    .map_err(query_err)?;

    Ok(DataQuality {
        total_rows: row.0,
        null_stars: row.1,
        null_categories: row.2,
        valid_rows: row.3,
        unique_categories: row.4,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn population_stddev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
