pub mod algorithms;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::Config;
pub use error::{RecommendError, StoreError};
pub use models::*;

use anyhow::Result;
use crate::config::StoreBackend;
use services::recommendation::RecommendationService;
use services::store::{InMemoryRatingStore, PgRatingStore, RatingStore};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recommendation_service: Arc<RecommendationService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let store = open_store(&config).await?;
        Ok(Self::with_store(config, store))
    }

    /// Wires the service around an already constructed store.
    pub fn with_store(config: Config, store: Arc<dyn RatingStore>) -> Self {
        let config = Arc::new(config);
        let recommendation_service = Arc::new(RecommendationService::new(store, config.clone()));

        Self {
            config,
            recommendation_service,
        }
    }
}

pub async fn open_store(config: &Config) -> Result<Arc<dyn RatingStore>> {
    let store: Arc<dyn RatingStore> = match config.store.backend {
        StoreBackend::Memory => match &config.store.seed_path {
            Some(path) => Arc::new(InMemoryRatingStore::from_seed_file(path).await?),
            None => {
                info!("No seed file configured, starting with an empty in-memory store");
                Arc::new(InMemoryRatingStore::new())
            }
        },
        StoreBackend::Postgres => {
            let store = PgRatingStore::connect(&config.postgres).await?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
    };
    Ok(store)
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
