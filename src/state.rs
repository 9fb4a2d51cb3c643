use crate::config::{AppConfig, StoreBackend};
use crate::db::PgStore;
use crate::llm::{GeminiClient, GenerativeModel};
use crate::storage::{MemoryStore, RecipeRepo, UserRepo};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub model: Arc<dyn GenerativeModel>,
    pub users: Arc<dyn UserRepo>,
    pub recipes: Arc<dyn RecipeRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let model = Arc::new(GeminiClient::new(&config.gemini)) as Arc<dyn GenerativeModel>;

        let state = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL missing")?;
                let store = Arc::new(PgStore::connect(url, config.database_max_connections).await?);
                info!("using postgres store");
                Self::from_parts(config.clone(), model, store.clone(), store)
            }
            StoreBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                info!("using in-memory store; data is lost on restart");
                Self::from_parts(config.clone(), model, store.clone(), store)
            }
        };
        Ok(state)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        model: Arc<dyn GenerativeModel>,
        users: Arc<dyn UserRepo>,
        recipes: Arc<dyn RecipeRepo>,
    ) -> Self {
        Self {
            config,
            model,
            users,
            recipes,
        }
    }
}
