use std::path::PathBuf;

use serde::Deserialize;

/// Which [`FragmentStore`](crate::storage::FragmentStore) implementation to use.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Filesystem,
}

/// Storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend selection. Default: memory.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./data/fragments".
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Maximum fragment data size in bytes. Default: 5 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
    /// Retry policy for read operations.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Backoff settings for retrying idempotent reads.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempts including the first. Default: 3.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,
    /// Delay before the first retry. Default: 50ms.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for any single delay. Default: 1000ms.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/fragments")
}
fn default_max_blob_size() -> u64 {
    5 * 1024 * 1024
}
fn default_max_attempts() -> u8 {
    3
}
fn default_base_delay_ms() -> u64 {
    50
}
fn default_max_delay_ms() -> u64 {
    1000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            max_blob_size: default_max_blob_size(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}
