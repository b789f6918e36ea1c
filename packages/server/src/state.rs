use std::sync::Arc;

use fragments_core::FragmentRepository;
use fragments_core::storage::FragmentStore;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub repo: FragmentRepository,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn FragmentStore>, config: AppConfig) -> Self {
        Self {
            repo: FragmentRepository::new(store, config.storage.retry),
            config,
        }
    }
}
