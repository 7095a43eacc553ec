use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::config::AppConfig;
use crate::db;
use crate::docs::{DocumentStore, FirestoreDocs};
use crate::notifications::{FcmPush, PushClient};
use crate::storage::{Storage, StorageClient};

/// Shared per-request state. The optional adapters stay `None` when their
/// configuration is absent, and every caller degrades accordingly.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub docs: Option<Arc<dyn DocumentStore>>,
    pub push: Option<Arc<dyn PushClient>>,
    pub storage: Option<Arc<dyn StorageClient>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config).await?;

        let docs = match &config.docstore {
            Some(cfg) => {
                info!(project_id = %cfg.project_id, "document store integration enabled");
                Some(Arc::new(FirestoreDocs::new(cfg)?) as Arc<dyn DocumentStore>)
            }
            None => None,
        };

        let push = match &config.push {
            Some(cfg) => Some(Arc::new(FcmPush::new(cfg)?) as Arc<dyn PushClient>),
            None => None,
        };

        let storage = match &config.storage {
            Some(cfg) => Some(Arc::new(Storage::new(cfg).await?) as Arc<dyn StorageClient>),
            None => None,
        };

        Ok(Self {
            db,
            config,
            docs,
            push,
            storage,
        })
    }
}
