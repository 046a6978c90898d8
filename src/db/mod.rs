//! Storage lifecycle: persistent-vs-in-memory resolution, cache management,
//! and the process-wide connection pool.

use crate::config::{is_directory_writable, StorageConfig};
use crate::error::{Error, Result};
use crate::models::CacheInfo;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, Connection, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

mod ingest;
mod source;

pub use ingest::load_products;
pub use source::{CachedRemoteSource, FixedPathSource, SourceResolver};

/// Owns the storage configuration, the source resolution strategy, and the
/// shared connection pool.
///
/// The pool slot is guarded by an RwLock so that replacing the connection
/// (liveness-probe rebuild, cache clear) is serialized against concurrent
/// query execution; a reader never observes a half-replaced store.
pub struct DataManager {
    config: StorageConfig,
    source: Box<dyn SourceResolver>,
    pool: RwLock<Option<SqlitePool>>,
}

impl DataManager {
    pub fn new(config: StorageConfig, source: Box<dyn SourceResolver>) -> Self {
        Self {
            config,
            source,
            pool: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Build the initial pool. Called once at startup before serving.
    pub async fn initialize(&self) -> Result<()> {
        let pool = self.build_pool().await?;
        *self.pool.write().await = Some(pool);
        Ok(())
    }

    /// Get the shared pool, probing liveness first and rebuilding once on a
    /// failed probe. Requests arriving before `initialize` get `NotReady`.
    pub async fn pool(&self) -> Result<SqlitePool> {
        {
            let guard = self.pool.read().await;
            match guard.as_ref() {
                Some(pool) => {
                    if sqlx::query("SELECT 1").execute(pool).await.is_ok() {
                        return Ok(pool.clone());
                    }
                    warn!("Database liveness probe failed, rebuilding connection");
                }
                None => return Err(Error::NotReady),
            }
        }

        let mut guard = self.pool.write().await;
        // Another caller may have finished the rebuild while we waited.
        if let Some(pool) = guard.as_ref() {
            if sqlx::query("SELECT 1").execute(pool).await.is_ok() {
                return Ok(pool.clone());
            }
        }
        let pool = self.build_pool().await?;
        if let Some(old) = guard.replace(pool.clone()) {
            old.close().await;
        }
        Ok(pool)
    }

    /// Delete cache artifacts and rebuild the connection. Absent artifacts
    /// are not an error. The previous pool stays in place if the rebuild
    /// fails, so a failed clear leaves the service queryable.
    pub async fn clear_cache(&self) -> Result<()> {
        let mut guard = self.pool.write().await;

        if let Some(csv) = self.source.cached_csv_path() {
            remove_if_exists(csv, "CSV cache")?;
        }
        remove_if_exists(&self.config.db_path, "database cache")?;

        let pool = self.build_pool().await?;
        if let Some(old) = guard.replace(pool) {
            old.close().await;
        }
        info!("Cache cleared and database connection rebuilt");
        Ok(())
    }

    /// Existence, size, and row count of each cache artifact plus the
    /// effective storage mode. Side-effect-free apart from a short-lived
    /// probe connection.
    pub async fn cache_info(&self) -> Result<CacheInfo> {
        let csv_path = self.source.cached_csv_path();
        let db_exists = self.config.db_path.exists();

        let mut info = CacheInfo {
            csv_exists: csv_path.map_or(false, |p| p.exists()),
            db_exists,
            csv_size_mb: csv_path.map_or(0.0, file_size_mb),
            db_size_mb: if db_exists {
                file_size_mb(&self.config.db_path)
            } else {
                0.0
            },
            record_count: 0,
            restricted_env: self.config.restricted_env,
            use_persistent_db: self.config.persistent_mode(),
        };

        if db_exists {
            // A failed probe reports zero records rather than an error.
            match self.probe_record_count().await {
                Ok(count) => info.record_count = count,
                Err(e) => warn!("Cache probe failed: {}", e),
            }
        }
        Ok(info)
    }

    /// Decide between persistent and in-memory storage and produce a loaded
    /// pool. An unwritable data directory degrades to in-memory; it never
    /// fails the build.
    async fn build_pool(&self) -> Result<SqlitePool> {
        let mut persistent = self.config.persistent_requested;
        if persistent {
            if let Err(Error::StorageUnavailable(reason)) = ensure_writable(&self.config.data_dir)
            {
                warn!("{}; falling back to in-memory database", reason);
                persistent = false;
            }
        }

        if persistent && self.config.db_path.exists() {
            match self.try_reuse_persistent().await {
                Some(pool) => return Ok(pool),
                None => std::fs::remove_file(&self.config.db_path)?,
            }
        }

        let pool = if persistent {
            info!(
                "Creating persistent database at {}",
                self.config.db_path.display()
            );
            self.open_persistent().await?
        } else {
            info!("Creating in-memory database");
            // A :memory: database is per-connection, so cap the pool at one.
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?
        };

        let csv_path = self.source.resolve().await?;
        ingest::load_products(&pool, &csv_path).await?;
        Ok(pool)
    }

    /// Reuse an existing persistent store only if it passes a row-count
    /// probe with at least one record; otherwise it gets discarded.
    async fn try_reuse_persistent(&self) -> Option<SqlitePool> {
        let pool = match self.open_persistent().await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Persistent database could not be opened ({}), rebuilding", e);
                return None;
            }
        };
        match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
        {
            Ok(count) if count > 0 => {
                info!("Reusing persistent database with {} records", count);
                Some(pool)
            }
            Ok(_) => {
                warn!("Persistent database is empty, reloading data");
                pool.close().await;
                None
            }
            Err(e) => {
                warn!("Persistent database failed row-count probe ({}), reloading data", e);
                pool.close().await;
                None
            }
        }
    }

    async fn open_persistent(&self) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::new()
            .filename(&self.config.db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(5000));
        Ok(SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?)
    }

    async fn probe_record_count(&self) -> Result<i64> {
        let mut conn = SqliteConnectOptions::new()
            .filename(&self.config.db_path)
            .read_only(true)
            .connect()
            .await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;
        Ok(count)
    }
}

fn ensure_writable(dir: &Path) -> Result<()> {
    if is_directory_writable(dir) {
        Ok(())
    } else {
        Err(Error::StorageUnavailable(format!(
            "directory {} is not writable",
            dir.display()
        )))
    }
}

fn remove_if_exists(path: &Path, what: &str) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
        info!("Cleared {} at {}", what, path.display());
    }
    Ok(())
}

fn file_size_mb(path: &Path) -> f64 {
    std::fs::metadata(path)
        .map(|m| (m.len() as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0)
        .unwrap_or(0.0)
}
