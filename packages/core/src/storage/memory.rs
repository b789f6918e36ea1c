use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StorageError;
use super::key::FragmentKey;
use super::traits::FragmentStore;
use crate::fragment::Fragment;

/// In-process fragment store backed by two concurrent maps.
///
/// Suitable for development and tests; contents are lost on restart.
#[derive(Debug)]
pub struct MemoryStore {
    meta: DashMap<FragmentKey, Fragment>,
    blobs: DashMap<FragmentKey, Vec<u8>>,
    max_size: u64,
}

impl MemoryStore {
    pub fn new(max_size: u64) -> Self {
        Self {
            meta: DashMap::new(),
            blobs: DashMap::new(),
            max_size,
        }
    }

    /// Number of stored data blobs, across all owners.
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }
}

#[async_trait]
impl FragmentStore for MemoryStore {
    async fn get_meta(&self, key: &FragmentKey) -> Result<Option<Fragment>, StorageError> {
        Ok(self.meta.get(key).map(|entry| entry.value().clone()))
    }

    async fn put_meta(&self, fragment: &Fragment) -> Result<(), StorageError> {
        self.meta.insert(fragment.key(), fragment.clone());
        Ok(())
    }

    async fn delete_meta(&self, key: &FragmentKey) -> Result<bool, StorageError> {
        Ok(self.meta.remove(key).is_some())
    }

    async fn list_meta(&self, owner_id: &str) -> Result<Vec<Fragment>, StorageError> {
        Ok(self
            .meta
            .iter()
            .filter(|entry| entry.key().owner_id() == owner_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get_blob(&self, key: &FragmentKey) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.blobs.get(key).map(|entry| entry.value().clone()))
    }

    async fn put_blob(&self, key: &FragmentKey, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }
        self.blobs.insert(key.clone(), data.to_vec());
        Ok(())
    }

    async fn delete_blob(&self, key: &FragmentKey) -> Result<bool, StorageError> {
        Ok(self.blobs.remove(key).is_some())
    }
}
