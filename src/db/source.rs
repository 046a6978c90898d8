//! Source dataset resolution strategies
//!
//! The storage layer is parameterized by how it locates the catalog CSV:
//! a fixed local path (tests, pre-provisioned deployments) or a cache-aware
//! resolver that fetches the dataset over HTTP when no local copy exists.

use crate::config::{is_directory_writable, StorageConfig};
use crate::error::{Error, Result};
use axum::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Strategy for locating the source CSV
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolve a readable path to the source CSV, fetching it if necessary
    async fn resolve(&self) -> Result<PathBuf>;

    /// Path of the locally cached copy, when this strategy owns one
    fn cached_csv_path(&self) -> Option<&Path> {
        None
    }
}

/// Always loads from one fixed CSV path; never fetches
pub struct FixedPathSource {
    path: PathBuf,
}

impl FixedPathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SourceResolver for FixedPathSource {
    async fn resolve(&self) -> Result<PathBuf> {
        if self.path.exists() {
            Ok(self.path.clone())
        } else {
            Err(Error::DataSourceUnavailable(format!(
                "CSV not found at {}",
                self.path.display()
            )))
        }
    }
}

/// Cache-aware resolver that downloads the dataset when no local copy exists
pub struct CachedRemoteSource {
    csv_path: PathBuf,
    data_dir: PathBuf,
    url: String,
    client: reqwest::Client,
}

impl CachedRemoteSource {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            csv_path: config.csv_path.clone(),
            data_dir: config.data_dir.clone(),
            url: config.dataset_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the dataset into a scratch directory, locate the first CSV in
    /// the downloaded bundle, and cache it in the data directory when that
    /// directory accepts writes.
    async fn download(&self) -> Result<PathBuf> {
        let scratch = std::env::temp_dir().join("prodstats-download");
        std::fs::create_dir_all(&scratch)?;

        info!("Downloading dataset from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let payload = response.bytes().await?;

        let target = scratch.join(remote_file_name(&self.url));
        std::fs::write(&target, &payload)?;

        let source_csv = first_csv_in(&scratch)?;

        if is_directory_writable(&self.data_dir) {
            std::fs::copy(&source_csv, &self.csv_path)?;
            info!("Dataset cached at {}", self.csv_path.display());
            Ok(self.csv_path.clone())
        } else {
            warn!(
                "Data directory is not writable, serving dataset from {}",
                source_csv.display()
            );
            Ok(source_csv)
        }
    }
}

#[async_trait]
impl SourceResolver for CachedRemoteSource {
    async fn resolve(&self) -> Result<PathBuf> {
        if self.csv_path.exists() {
            info!("Using cached dataset at {}", self.csv_path.display());
            return Ok(self.csv_path.clone());
        }
        info!("Dataset not found locally, fetching from remote source");
        self.download().await
    }

    fn cached_csv_path(&self) -> Option<&Path> {
        Some(&self.csv_path)
    }
}

/// File name for the downloaded payload, taken from the URL's last segment
fn remote_file_name(url: &str) -> String {
    let name = url
        .rsplit('/')
        .next()
        .unwrap_or("")
        .split('?')
        .next()
        .unwrap_or("");
    if name.is_empty() {
        "dataset.csv".to_string()
    } else {
        name.to_string()
    }
}

/// First CSV file in a directory, by name order
fn first_csv_in(dir: &Path) -> Result<PathBuf> {
    let mut csvs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    csvs.sort();
    csvs.into_iter().next().ok_or_else(|| {
        Error::DataSourceUnavailable("no CSV file found in the downloaded dataset".to_string())
    })
}
