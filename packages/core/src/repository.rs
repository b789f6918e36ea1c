use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::RetryConfig;
use crate::error::{FragmentError, Result};
use crate::fragment::{Fragment, FragmentInit};
use crate::media::base_mime_type;
use crate::retry::retry_read;
use crate::storage::{FragmentKey, FragmentStore};

/// Result of listing an owner's fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum FragmentList {
    Ids(Vec<String>),
    Expanded(Vec<Fragment>),
}

impl FragmentList {
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Expanded(fragments) => fragments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owner-scoped fragment operations over a [`FragmentStore`].
///
/// Metadata is the visibility switch: data is always written before metadata
/// and metadata is always removed before data, so a reader never sees a
/// metadata record whose blob was not yet written.
#[derive(Clone)]
pub struct FragmentRepository {
    store: Arc<dyn FragmentStore>,
    retry: RetryConfig,
}

impl FragmentRepository {
    pub fn new(store: Arc<dyn FragmentStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// Validate input, then store data followed by metadata.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn create(
        &self,
        owner_id: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<Fragment> {
        let size = i64::try_from(data.len())
            .map_err(|_| FragmentError::validation("size", "payload too large"))?;
        let fragment = FragmentInit::new(owner_id, content_type)
            .size(size)
            .build()?;
        if !fragment.media_type().is_creatable() {
            return Err(FragmentError::validation(
                "type",
                format!("fragments of type {} cannot be created", fragment.mime_type()),
            ));
        }

        let key = fragment.key();
        self.store.put_blob(&key, data).await?;

        if let Err(e) = self.store.put_meta(&fragment).await {
            error!(id = fragment.id(), error = %e, "Metadata write failed, removing data");
            if let Err(cleanup) = self.store.delete_blob(&key).await {
                warn!(id = fragment.id(), error = %cleanup, "Failed to remove orphaned data");
            }
            return Err(e.into());
        }

        info!(id = fragment.id(), content_type = fragment.content_type(), "Fragment created");
        Ok(fragment)
    }

    /// Metadata for a fragment visible to `owner_id`.
    #[instrument(skip(self))]
    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Fragment> {
        require_owner(owner_id)?;
        let key = FragmentKey::new(owner_id, id);
        let key = &key;
        let store = &self.store;
        retry_read(&self.retry, "get_meta", move || store.get_meta(key))
            .await?
            .ok_or_else(|| FragmentError::not_found(id))
    }

    /// Raw bytes for a fragment visible to `owner_id`.
    #[instrument(skip(self))]
    pub async fn get_data(&self, owner_id: &str, id: &str) -> Result<Vec<u8>> {
        let fragment = self.get(owner_id, id).await?;
        self.load_data(&fragment).await
    }

    /// Raw bytes for an already loaded fragment.
    pub async fn load_data(&self, fragment: &Fragment) -> Result<Vec<u8>> {
        let key = fragment.key();
        let key = &key;
        let store = &self.store;
        match retry_read(&self.retry, "get_blob", move || store.get_blob(key)).await? {
            Some(data) => Ok(data),
            None => {
                error!(id = fragment.id(), "Metadata exists but data is missing");
                Err(FragmentError::DataMissing {
                    id: fragment.id().to_string(),
                })
            }
        }
    }

    /// All fragments of `owner_id`, oldest first.
    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: &str, expand: bool) -> Result<FragmentList> {
        require_owner(owner_id)?;
        let store = &self.store;
        let mut fragments =
            retry_read(&self.retry, "list_meta", move || store.list_meta(owner_id)).await?;
        fragments.sort_by(|a, b| a.created().cmp(&b.created()).then_with(|| a.id().cmp(b.id())));
        debug!(count = fragments.len(), "Listed fragments");

        Ok(if expand {
            FragmentList::Expanded(fragments)
        } else {
            FragmentList::Ids(fragments.into_iter().map(|f| f.id().to_string()).collect())
        })
    }

    /// Replace a fragment's data with a payload of the same base type.
    ///
    /// On a type mismatch nothing is written. If the metadata write fails the
    /// previous data is put back.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn replace_data(
        &self,
        owner_id: &str,
        id: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<Fragment> {
        let mut fragment = self.get(owner_id, id).await?;
        let declared = base_mime_type(content_type)?;
        if declared != fragment.mime_type() {
            return Err(FragmentError::TypeMismatch {
                expected: fragment.mime_type().to_string(),
                actual: declared,
            });
        }

        let key = fragment.key();
        let previous = self.store.get_blob(&key).await?;

        fragment.record_write(data.len() as u64);
        self.store.put_blob(&key, data).await?;

        if let Err(e) = self.store.put_meta(&fragment).await {
            error!(id, error = %e, "Metadata write failed, restoring previous data");
            let restored = match &previous {
                Some(old) => self.store.put_blob(&key, old).await,
                None => self.store.delete_blob(&key).await.map(|_| ()),
            };
            if let Err(restore) = restored {
                warn!(id, error = %restore, "Failed to restore previous data");
            }
            return Err(e.into());
        }

        info!(id, size = fragment.size(), "Fragment data replaced");
        Ok(fragment)
    }

    /// Remove a fragment's metadata and data.
    #[instrument(skip(self))]
    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<()> {
        let fragment = self.get(owner_id, id).await?;
        let key = fragment.key();

        if !self.store.delete_meta(&key).await? {
            // Lost a race with another delete.
            return Err(FragmentError::not_found(id));
        }
        let removed = match self.store.delete_blob(&key).await {
            Err(e) if e.is_transient() => {
                warn!(id, error = %e, "Failed to delete fragment data, retrying once");
                self.store.delete_blob(&key).await
            }
            other => other,
        };
        match removed {
            Ok(true) => {}
            Ok(false) => warn!(id, "Fragment had no data to delete"),
            Err(e) => warn!(id, error = %e, "Failed to delete fragment data"),
        }

        info!(id, "Fragment deleted");
        Ok(())
    }
}

fn require_owner(owner_id: &str) -> Result<()> {
    if owner_id.trim().is_empty() {
        return Err(FragmentError::validation("ownerId", "owner id is required"));
    }
    Ok(())
}
