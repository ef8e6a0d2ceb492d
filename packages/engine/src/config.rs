use std::path::PathBuf;
use std::sync::Arc;

use common::retry::RetryPolicy;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::S3BlobStore;
use common::storage::{BlobStore, StorageError};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// S3-compatible backend settings. When present, the blob store is the
/// configured bucket instead of the local filesystem.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Lifetime of presigned share links, seconds. Default: 3600.
    #[serde(default = "default_share_expiry_secs")]
    pub share_expiry_secs: u32,
}

fn default_share_expiry_secs() -> u32 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Container (folder or bucket) holding submission payloads.
    pub container: String,
    /// Root directory for the filesystem backend.
    pub root: PathBuf,
    /// Base URL under which stored payloads are addressable.
    pub public_base_url: String,
    pub s3: Option<S3Config>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecordsConfig {
    /// Connection URL of the tabular metadata store.
    pub database_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PendingConfig {
    /// Seconds a pending upload may wait for a target selection.
    #[serde(default = "default_pending_ttl_secs")]
    pub ttl_secs: u64,
    /// Seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_pending_ttl_secs() -> u64 {
    900
}
fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_pending_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    /// Delay between successive payload fetches while listing, in
    /// milliseconds. Throughput control for the downstream store, not a
    /// correctness requirement.
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
}

fn default_pace_ms() -> u64 {
    1000
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            pace_ms: default_pace_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub records: RecordsConfig,
    /// Identities allowed to register routing targets.
    #[serde(default)]
    pub admin_ids: Vec<i64>,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub pending: PendingConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

impl EngineConfig {
    /// Load configuration once at startup. A missing required value
    /// (storage container, records database URL) is a fatal error here.
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("storage.root", "./data/blobs")?
            .set_default("storage.public_base_url", "file:///data/blobs")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., HANDIN__STORAGE__CONTAINER)
            .add_source(Environment::with_prefix("HANDIN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

/// Build the configured blob store backend.
pub async fn build_blob_store(
    storage: &StorageConfig,
) -> Result<Arc<dyn BlobStore>, StorageError> {
    match &storage.s3 {
        Some(s3) => Ok(Arc::new(S3BlobStore::new(
            &storage.container,
            &s3.region,
            &s3.endpoint,
            &s3.access_key,
            &s3.secret_key,
            s3.share_expiry_secs,
        )?)),
        None => Ok(Arc::new(
            FilesystemBlobStore::new(
                storage.root.clone(),
                &storage.container,
                &storage.public_base_url,
            )
            .await?,
        )),
    }
}
