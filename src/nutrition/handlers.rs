use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::docs::DailyLog;
use crate::error::AppError;
use crate::state::AppState;

use super::service;
use super::stats::{NutritionStats, DEFAULT_CALORIES_TARGET};

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_log_limit")]
    pub limit: u32,
}

fn default_log_limit() -> u32 {
    30
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats/nutrition", get(all_stats))
        .route("/stats/nutrition/:user_id", get(user_stats))
        .route("/stats/nutrition/:user_id/logs", get(user_logs))
}

/// Cross-user overview. Degrades to an empty list when the document store is
/// disabled or unreachable.
#[instrument(skip(state))]
pub async fn all_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<NutritionStats>>, AppError> {
    let Some(docs) = &state.docs else {
        return Ok(Json(Vec::new()));
    };
    match service::all_users_stats(docs.as_ref()).await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            warn!(error = %e, "nutrition overview unavailable");
            Ok(Json(Vec::new()))
        }
    }
}

#[instrument(skip(state))]
pub async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<NutritionStats>, AppError> {
    let Some(docs) = &state.docs else {
        return Ok(Json(zeroed(&user_id)));
    };
    match service::calculate_stats(docs.as_ref(), &user_id).await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            warn!(error = %e, %user_id, "nutrition stats unavailable");
            Ok(Json(zeroed(&user_id)))
        }
    }
}

#[instrument(skip(state))]
pub async fn user_logs(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<DailyLog>>, AppError> {
    let Some(docs) = &state.docs else {
        return Ok(Json(Vec::new()));
    };
    match service::user_daily_logs(docs.as_ref(), &user_id, query.limit).await {
        Ok(logs) => Ok(Json(logs)),
        Err(e) => {
            warn!(error = %e, %user_id, "daily logs unavailable");
            Ok(Json(Vec::new()))
        }
    }
}

fn zeroed(user_id: &str) -> NutritionStats {
    NutritionStats {
        user_id: user_id.to_string(),
        calories_target: DEFAULT_CALORIES_TARGET,
        ..Default::default()
    }
}
