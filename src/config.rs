use serde::Deserialize;

/// Document store connection parameters. Present only when the integration
/// is enabled (`DOCSTORE_ENABLED=true`).
#[derive(Debug, Clone, Deserialize)]
pub struct DocStoreConfig {
    pub project_id: String,
    pub endpoint: String,
    pub token: Option<String>,
}

/// Push provider (FCM-style) parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    pub server_key: String,
    pub endpoint: String,
}

/// Object storage (S3/MinIO) parameters for hosted food images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub docstore: Option<DocStoreConfig>,
    pub push: Option<PushConfig>,
    pub storage: Option<StorageConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;

        let docstore_enabled = std::env::var("DOCSTORE_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let docstore = if docstore_enabled {
            Some(DocStoreConfig {
                project_id: std::env::var("DOCSTORE_PROJECT_ID")?,
                endpoint: std::env::var("DOCSTORE_ENDPOINT")
                    .unwrap_or_else(|_| "https://firestore.googleapis.com/v1".into()),
                token: std::env::var("DOCSTORE_TOKEN").ok(),
            })
        } else {
            None
        };

        let push = std::env::var("FCM_SERVER_KEY").ok().map(|server_key| PushConfig {
            server_key,
            endpoint: std::env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| "https://fcm.googleapis.com/fcm/send".into()),
        });

        let storage = match std::env::var("MINIO_ENDPOINT") {
            Ok(endpoint) => Some(StorageConfig {
                endpoint,
                bucket: std::env::var("MINIO_BUCKET")?,
                access_key: std::env::var("MINIO_ACCESS_KEY")?,
                secret_key: std::env::var("MINIO_SECRET_KEY")?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            docstore,
            push,
            storage,
        })
    }
}
