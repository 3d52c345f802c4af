use std::sync::Arc;

use catalog::{CatalogRepository, memory::MemoryRepository, remote::RestRepository};
use tracing::info;

use super::{
    config::{Backend, Config},
    error::AppError,
    session::SessionStore,
};

pub struct State {
    pub config: Config,
    pub repository: Arc<dyn CatalogRepository>,
    pub sessions: SessionStore,
}

impl State {
    pub fn new(config: Config) -> Result<Arc<Self>, AppError> {
        let repository: Arc<dyn CatalogRepository> = match &config.backend {
            Backend::Remote { url, key } => {
                info!("Using hosted backend at {url}");
                Arc::new(RestRepository::new(url, key, &config.image_bucket)?)
            }
            Backend::Memory { seed: Some(path) } => {
                info!("Using in-memory backend seeded from {}", path.display());
                Arc::new(MemoryRepository::from_seed_file(path)?)
            }
            Backend::Memory { seed: None } => {
                info!("Using empty in-memory backend");
                Arc::new(MemoryRepository::new())
            }
        };

        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: Config, repository: Arc<dyn CatalogRepository>) -> Arc<Self> {
        let sessions = SessionStore::new(config.session_ttl);

        Arc::new(Self {
            config,
            repository,
            sessions,
        })
    }
}
