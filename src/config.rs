//! Configuration and storage environment resolution
//!
//! All environment and filesystem probing happens once at startup and lands
//! in an explicit [`StorageConfig`] that the storage layer receives by
//! reference; nothing below this module reads ambient state.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Endpoint expected to serve the raw catalog CSV payload
const DEFAULT_DATASET_URL: &str =
    "https://www.kaggle.com/api/v1/datasets/download/asaniczka/amazon-uk-products-dataset-2023/amz_uk_processed_data.csv";

const CSV_FILE_NAME: &str = "amz_uk_processed_data.csv";
const DB_FILE_NAME: &str = "products.db";

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "prodstats",
    version,
    about = "Product catalog rating analytics service"
)]
pub struct Args {
    /// Data directory for the CSV cache and the database file
    #[arg(long, env = "PRODSTATS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Remote source for the catalog CSV (must serve the CSV payload itself)
    #[arg(long, env = "DATASET_URL", default_value = DEFAULT_DATASET_URL)]
    pub dataset_url: String,

    /// Use a persistent on-disk database when the filesystem allows it
    #[arg(
        long,
        env = "USE_PERSISTENT_DB",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub use_persistent_db: bool,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
}

/// Storage environment resolved once at startup
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Local cache location for the source CSV
    pub csv_path: PathBuf,
    /// Persistent database file location
    pub db_path: PathBuf,
    pub dataset_url: String,
    /// Persistent storage requested via CLI/environment override
    pub persistent_requested: bool,
    /// Container or otherwise restricted execution environment detected
    pub restricted_env: bool,
}

impl StorageConfig {
    pub fn resolve(args: &Args) -> Self {
        let data_dir = resolve_data_dir(args.data_dir.clone());
        Self {
            csv_path: data_dir.join(CSV_FILE_NAME),
            db_path: data_dir.join(DB_FILE_NAME),
            data_dir,
            dataset_url: args.dataset_url.clone(),
            persistent_requested: args.use_persistent_db,
            restricted_env: detect_restricted_env(),
        }
    }

    /// Effective storage mode given current filesystem state: persistent
    /// only when requested and the data directory accepts writes.
    pub fn persistent_mode(&self) -> bool {
        self.persistent_requested && is_directory_writable(&self.data_dir)
    }

    /// Create the data directory when the environment allows it. A failure
    /// here is not fatal: the storage layer degrades to in-memory.
    pub fn ensure_data_dir(&self) {
        if let Err(e) = std::fs::create_dir_all(&self.data_dir) {
            warn!(
                "Could not create data directory {}: {}",
                self.data_dir.display(),
                e
            );
        }
    }
}

/// Data directory resolution priority order:
/// 1. Command-line argument / environment variable (via clap)
/// 2. TOML config file
/// 3. Compiled default
fn resolve_data_dir(cli_arg: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_arg {
        return dir;
    }
    if let Some(dir) = data_dir_from_config_file() {
        return dir;
    }
    PathBuf::from("data")
}

fn data_dir_from_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("prodstats").join("config.toml");
    let content = std::fs::read_to_string(path).ok()?;
    let config = toml::from_str::<toml::Value>(&content).ok()?;
    config
        .get("data_dir")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

/// Detect a restricted (containerized) execution environment via sentinel
/// filesystem markers or an explicit environment flag.
pub fn detect_restricted_env() -> bool {
    if Path::new("/.dockerenv").exists() {
        return true;
    }
    if let Ok(cgroup) = std::fs::read_to_string("/proc/1/cgroup") {
        if cgroup.contains("docker") || cgroup.contains("containerd") {
            return true;
        }
    }
    std::env::var("DOCKER_CONTAINER").map_or(false, |v| v == "true")
}

/// Probe a directory for writability with a create/delete round trip
pub fn is_directory_writable(dir: &Path) -> bool {
    let probe = dir.join(".write_probe");
    match std::fs::File::create(&probe) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}
