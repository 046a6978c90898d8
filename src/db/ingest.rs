//! CSV ingestion into the products table
//!
//! The load applies explicit per-column coercion (numeric casts, boolean
//! cast, currency-symbol stripping on price) and no quality filter: rows
//! with unparseable or empty numeric fields land with NULLs and are
//! excluded later by the query layer's predicates.

use crate::error::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;
use tracing::info;

/// Rows per INSERT statement; 10 columns per row keeps each statement well
/// under SQLite's bind limit.
const INSERT_BATCH: usize = 100;

#[derive(Debug)]
struct ProductRow {
    asin: String,
    title: String,
    img_url: String,
    product_url: String,
    stars: Option<f64>,
    reviews: Option<i64>,
    price: Option<f64>,
    is_best_seller: Option<bool>,
    bought_in_last_month: Option<i64>,
    category_name: Option<String>,
}

/// Drop and recreate the products table from the CSV at `csv_path`.
/// Returns the number of rows loaded.
pub async fn load_products(pool: &SqlitePool, csv_path: &Path) -> Result<i64> {
    sqlx::query("DROP TABLE IF EXISTS products")
        .execute(pool)
        .await?;
    sqlx::query(
        r#"
        CREATE TABLE products (
            asin TEXT,
            title TEXT,
            img_url TEXT,
            product_url TEXT,
            stars REAL,
            reviews INTEGER,
            price REAL,
            is_best_seller INTEGER,
            bought_in_last_month INTEGER,
            category_name TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    let mut reader = csv::Reader::from_path(csv_path)?;
    let columns = CsvColumns::from_headers(reader.headers()?);

    let mut tx = pool.begin().await?;
    let mut batch: Vec<ProductRow> = Vec::with_capacity(INSERT_BATCH);
    let mut total: i64 = 0;

    for record in reader.records() {
        batch.push(columns.parse(&record?));
        if batch.len() == INSERT_BATCH {
            insert_batch(&mut tx, &batch).await?;
            total += batch.len() as i64;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        insert_batch(&mut tx, &batch).await?;
        total += batch.len() as i64;
    }
    tx.commit().await?;

    // Refresh planner statistics; the table is immutable from here on.
    sqlx::query("ANALYZE products").execute(pool).await?;

    info!("Loaded {} records into products table", total);
    Ok(total)
}

async fn insert_batch(tx: &mut sqlx::Transaction<'_, Sqlite>, rows: &[ProductRow]) -> Result<()> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT INTO products (asin, title, img_url, product_url, stars, reviews, price, \
         is_best_seller, bought_in_last_month, category_name) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(&row.asin)
            .push_bind(&row.title)
            .push_bind(&row.img_url)
            .push_bind(&row.product_url)
            .push_bind(row.stars)
            .push_bind(row.reviews)
            .push_bind(row.price)
            .push_bind(row.is_best_seller)
            .push_bind(row.bought_in_last_month)
            .push_bind(&row.category_name);
    });
    builder.build().execute(&mut **tx).await?;
    Ok(())
}

/// Header positions of the source CSV's columns
struct CsvColumns {
    asin: Option<usize>,
    title: Option<usize>,
    img_url: Option<usize>,
    product_url: Option<usize>,
    stars: Option<usize>,
    reviews: Option<usize>,
    price: Option<usize>,
    is_best_seller: Option<usize>,
    bought_in_last_month: Option<usize>,
    category_name: Option<usize>,
}

impl CsvColumns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|h| h == name);
        Self {
            asin: position("asin"),
            title: position("title"),
            img_url: position("imgUrl"),
            product_url: position("productURL"),
            stars: position("stars"),
            reviews: position("reviews"),
            price: position("price"),
            is_best_seller: position("isBestSeller"),
            bought_in_last_month: position("boughtInLastMonth"),
            category_name: position("categoryName"),
        }
    }

    fn parse(&self, record: &csv::StringRecord) -> ProductRow {
        let field =
            |index: Option<usize>| index.and_then(|i| record.get(i)).unwrap_or("").trim();
        ProductRow {
            asin: field(self.asin).to_string(),
            title: field(self.title).to_string(),
            img_url: field(self.img_url).to_string(),
            product_url: field(self.product_url).to_string(),
            stars: parse_f64(field(self.stars)),
            reviews: parse_i64(field(self.reviews)),
            price: parse_price(field(self.price)),
            is_best_seller: parse_bool(field(self.is_best_seller)),
            bought_in_last_month: parse_i64(field(self.bought_in_last_month)),
            category_name: non_empty(field(self.category_name)),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn parse_f64(s: &str) -> Option<f64> {
    s.parse().ok()
}

fn parse_i64(s: &str) -> Option<i64> {
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|v| v as i64))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Strip the currency prefix before the numeric cast ("£12.99" -> 12.99)
fn parse_price(s: &str) -> Option<f64> {
    let cleaned = s.replace('£', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        cleaned.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    #[test]
    fn price_strips_currency_symbol() {
        assert_eq!(parse_price("£12.99"), Some(12.99));
        assert_eq!(parse_price("£ 5"), Some(5.0));
        assert_eq!(parse_price("7.5"), Some(7.5));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("n/a"), None);
    }

    #[test]
    fn booleans_parse_both_spellings() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn integers_accept_float_spellings() {
        assert_eq!(parse_i64("42"), Some(42));
        assert_eq!(parse_i64("42.0"), Some(42));
        assert_eq!(parse_i64("x"), None);
    }

    #[tokio::test]
    async fn load_coerces_columns_and_keeps_bad_rows() {
        let tmp = TempDir::new().unwrap();
        let csv = tmp.path().join("catalog.csv");
        std::fs::write(
            &csv,
            "asin,title,imgUrl,productURL,stars,reviews,price,isBestSeller,boughtInLastMonth,categoryName\n\
             B001,Kettle,http://i/1,http://p/1,4.5,120,£12.99,True,40,Kitchen\n\
             B002,Mystery,http://i/2,http://p/2,,,bad,,,\n\
             B003,Lamp,http://i/3,http://p/3,3.0,7,£8.00,False,2,Lighting\n",
        )
        .unwrap();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let loaded = load_products(&pool, &csv).await.unwrap();
        assert_eq!(loaded, 3);

        let (stars, price, category): (Option<f64>, Option<f64>, Option<String>) =
            sqlx::query_as("SELECT stars, price, category_name FROM products WHERE asin = 'B001'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(stars, Some(4.5));
        assert_eq!(price, Some(12.99));
        assert_eq!(category, Some("Kitchen".to_string()));

        // The malformed row loads with NULLs rather than being dropped.
        let (stars, price, category): (Option<f64>, Option<f64>, Option<String>) =
            sqlx::query_as("SELECT stars, price, category_name FROM products WHERE asin = 'B002'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(stars, None);
        assert_eq!(price, None);
        assert_eq!(category, None);
    }

    #[tokio::test]
    async fn reload_replaces_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let csv = tmp.path().join("catalog.csv");
        let header = "asin,title,imgUrl,productURL,stars,reviews,price,isBestSeller,boughtInLastMonth,categoryName";
        std::fs::write(&csv, format!("{header}\nB001,A,i,p,4.0,1,£1,True,1,Cat\n")).unwrap();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        assert_eq!(load_products(&pool, &csv).await.unwrap(), 1);
        std::fs::write(
            &csv,
            format!("{header}\nB002,B,i,p,2.0,1,£1,False,1,Cat\nB003,C,i,p,5.0,1,£1,False,1,Cat\n"),
        )
        .unwrap();
        assert_eq!(load_products(&pool, &csv).await.unwrap(), 2);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
