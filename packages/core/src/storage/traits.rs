use async_trait::async_trait;

use super::error::StorageError;
use super::key::FragmentKey;
use crate::fragment::Fragment;

/// Owner-scoped storage for fragment metadata and data.
///
/// Metadata and data live in two independent keyspaces; keeping them
/// consistent is the repository's job. Missing records are `Ok(None)` or
/// `Ok(false)`, never errors.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Fetch the metadata record for a key.
    async fn get_meta(&self, key: &FragmentKey) -> Result<Option<Fragment>, StorageError>;

    /// Insert or overwrite the metadata record for `fragment.key()`.
    async fn put_meta(&self, fragment: &Fragment) -> Result<(), StorageError>;

    /// Delete a metadata record.
    ///
    /// Returns `true` if the record was deleted, `false` if it did not exist.
    async fn delete_meta(&self, key: &FragmentKey) -> Result<bool, StorageError>;

    /// All metadata records belonging to `owner_id`, in no particular order.
    async fn list_meta(&self, owner_id: &str) -> Result<Vec<Fragment>, StorageError>;

    /// Fetch the raw bytes for a key.
    async fn get_blob(&self, key: &FragmentKey) -> Result<Option<Vec<u8>>, StorageError>;

    /// Insert or overwrite the raw bytes for a key.
    async fn put_blob(&self, key: &FragmentKey, data: &[u8]) -> Result<(), StorageError>;

    /// Delete the raw bytes for a key.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete_blob(&self, key: &FragmentKey) -> Result<bool, StorageError>;
}
