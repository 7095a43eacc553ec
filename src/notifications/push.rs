use std::time::Duration;

use axum::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::PushConfig;

/// Android channel the mobile app registers for admin messages.
pub const NOTIFICATION_CHANNEL: &str = "admin_channel";
/// Data-payload tag the mobile client routes on.
pub const NOTIFICATION_TYPE: &str = "admin_notification";

#[derive(Debug, Clone)]
pub struct AdminMessage {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum PushError {
    /// The provider reports the token as permanently gone; the caller should
    /// drop it from the audience.
    #[error("device token is no longer registered")]
    Unregistered,

    #[error("push provider rejected the message: {0}")]
    Provider(String),

    #[error("push provider unreachable: {0}")]
    Unavailable(String),
}

/// One outbound call per device token.
#[async_trait]
pub trait PushClient: Send + Sync {
    async fn send(&self, token: &str, message: &AdminMessage) -> Result<(), PushError>;
}

pub struct FcmPush {
    http: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl FcmPush {
    pub fn new(config: &PushConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            server_key: config.server_key.clone(),
        })
    }
}

#[async_trait]
impl PushClient for FcmPush {
    async fn send(&self, token: &str, message: &AdminMessage) -> Result<(), PushError> {
        let payload = json!({
            "to": token,
            "priority": "high",
            "notification": {
                "title": message.title,
                "body": message.body,
                "sound": "default",
                "android_channel_id": NOTIFICATION_CHANNEL,
                "visibility": "public",
            },
            "data": {
                "title": message.title,
                "message": message.body,
                "type": NOTIFICATION_TYPE,
            },
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("key={}", self.server_key),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PushError::Provider(format!("status {status}")));
        }

        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| PushError::Provider(e.to_string()))?;
        if body.get("failure").and_then(Value::as_i64).unwrap_or(0) == 0 {
            return Ok(());
        }
        let reason = body
            .pointer("/results/0/error")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        match reason {
            "NotRegistered" | "InvalidRegistration" => Err(PushError::Unregistered),
            other => Err(PushError::Provider(other.to_string())),
        }
    }
}
