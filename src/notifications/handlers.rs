use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::state::AppState;

use super::service::{self, Audience};

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub audience: Audience,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub sent: u32,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/notifications", post(send_notification))
}

#[instrument(skip(state, payload))]
pub async fn send_notification(
    State(state): State<AppState>,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<Json<SendNotificationResponse>, AppError> {
    if payload.title.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(AppError::BadRequest(
            "title and message must be non-empty".into(),
        ));
    }

    let (Some(docs), Some(push)) = (&state.docs, &state.push) else {
        warn!("notification send requested with document store or push provider disabled");
        return Ok(Json(SendNotificationResponse { sent: 0 }));
    };

    let (docs, push) = (docs.as_ref(), push.as_ref());
    let (title, message) = (payload.title.trim(), payload.message.trim());
    let sent = match payload.audience {
        Audience::All => service::send_to_all(docs, push, title, message).await?,
        Audience::Active => service::send_to_active(docs, push, title, message).await?,
        Audience::New => service::send_to_new(docs, push, title, message).await?,
    };

    info!(sent, audience = ?payload.audience, "notification fan-out finished");
    Ok(Json(SendNotificationResponse { sent }))
}
