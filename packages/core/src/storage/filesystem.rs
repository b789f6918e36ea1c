use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use super::error::StorageError;
use super::key::FragmentKey;
use super::traits::FragmentStore;
use crate::fragment::Fragment;

const META_EXT: &str = "json";
const BLOB_EXT: &str = "bin";

/// Filesystem-backed fragment store.
///
/// Records are grouped per owner:
/// `{base_path}/{sha256(owner_id)}/{id}.json` for metadata and
/// `{base_path}/{sha256(owner_id)}/{id}.bin` for data.
/// Writes go to a temp file first and are renamed into place, so readers only
/// ever see complete files.
pub struct FilesystemStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemStore {
    /// Create a new filesystem store, creating its directories if needed.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn owner_dir(&self, owner_id: &str) -> PathBuf {
        self.base_path.join(FragmentKey::owner_shard(owner_id))
    }

    fn record_path(&self, key: &FragmentKey, ext: &str) -> PathBuf {
        self.owner_dir(key.owner_id())
            .join(format!("{}.{ext}", key.id()))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn checked_key(key: &FragmentKey) -> Result<(), StorageError> {
        if key.has_path_safe_id() {
            Ok(())
        } else {
            Err(StorageError::InvalidKey(format!(
                "fragment id {:?} is not path-safe",
                key.id()
            )))
        }
    }

    async fn write_atomic(&self, path: PathBuf, data: &[u8]) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_optional(&self, path: PathBuf) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_optional(&self, path: PathBuf) -> Result<bool, StorageError> {
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn decode_meta(key: &str, bytes: &[u8]) -> Result<Fragment, StorageError> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl FragmentStore for FilesystemStore {
    async fn get_meta(&self, key: &FragmentKey) -> Result<Option<Fragment>, StorageError> {
        // An id that cannot be a file name was never stored.
        if !key.has_path_safe_id() {
            return Ok(None);
        }
        let Some(bytes) = self.read_optional(self.record_path(key, META_EXT)).await? else {
            return Ok(None);
        };
        let fragment = Self::decode_meta(&key.to_string(), &bytes)?;
        if fragment.owner_id() != key.owner_id() || fragment.id() != key.id() {
            return Err(StorageError::Corrupt {
                key: key.to_string(),
                reason: "record does not match its location".into(),
            });
        }
        Ok(Some(fragment))
    }

    async fn put_meta(&self, fragment: &Fragment) -> Result<(), StorageError> {
        let key = fragment.key();
        Self::checked_key(&key)?;
        let bytes = serde_json::to_vec(fragment).map_err(StorageError::Serialization)?;
        self.write_atomic(self.record_path(&key, META_EXT), &bytes)
            .await
    }

    async fn delete_meta(&self, key: &FragmentKey) -> Result<bool, StorageError> {
        if !key.has_path_safe_id() {
            return Ok(false);
        }
        self.remove_optional(self.record_path(key, META_EXT)).await
    }

    async fn list_meta(&self, owner_id: &str) -> Result<Vec<Fragment>, StorageError> {
        let dir = self.owner_dir(owner_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut fragments = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            // Deleted between read_dir and read.
            let Some(bytes) = self.read_optional(path.clone()).await? else {
                continue;
            };
            match Self::decode_meta(&path.display().to_string(), &bytes) {
                Ok(fragment) if fragment.owner_id() == owner_id => fragments.push(fragment),
                Ok(_) => warn!(path = %path.display(), "Skipping metadata owned by another owner"),
                Err(e) => return Err(e),
            }
        }
        Ok(fragments)
    }

    async fn get_blob(&self, key: &FragmentKey) -> Result<Option<Vec<u8>>, StorageError> {
        if !key.has_path_safe_id() {
            return Ok(None);
        }
        self.read_optional(self.record_path(key, BLOB_EXT)).await
    }

    async fn put_blob(&self, key: &FragmentKey, data: &[u8]) -> Result<(), StorageError> {
        Self::checked_key(key)?;
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }
        self.write_atomic(self.record_path(key, BLOB_EXT), data)
            .await
    }

    async fn delete_blob(&self, key: &FragmentKey) -> Result<bool, StorageError> {
        if !key.has_path_safe_id() {
            return Ok(false);
        }
        self.remove_optional(self.record_path(key, BLOB_EXT)).await
    }
}
