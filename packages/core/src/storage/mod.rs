mod error;
mod key;
mod traits;

pub mod filesystem;
pub mod memory;

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

pub use error::StorageError;
pub use filesystem::FilesystemStore;
pub use key::FragmentKey;
pub use memory::MemoryStore;
pub use traits::FragmentStore;

/// Open the backend selected by `config`.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn FragmentStore>, StorageError> {
    match config.backend {
        StorageBackend::Memory => {
            info!(max_blob_size = config.max_blob_size, "Using in-memory fragment store");
            Ok(Arc::new(MemoryStore::new(config.max_blob_size)))
        }
        StorageBackend::Filesystem => {
            info!(
                path = %config.path.display(),
                max_blob_size = config.max_blob_size,
                "Using filesystem fragment store"
            );
            let store = FilesystemStore::new(config.path.clone(), config.max_blob_size).await?;
            Ok(Arc::new(store))
        }
    }
}
