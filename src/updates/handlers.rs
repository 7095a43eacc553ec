use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

use super::repo::{self, FoodUpdate};

#[derive(Debug, Deserialize)]
pub struct UpdatesQuery {
    pub food_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

pub fn router() -> Router<AppState> {
    Router::new().route("/updates", get(list_updates))
}

#[instrument(skip(state))]
pub async fn list_updates(
    State(state): State<AppState>,
    Query(query): Query<UpdatesQuery>,
) -> Result<Json<Vec<FoodUpdate>>, AppError> {
    let rows = match query.food_id {
        Some(food_id) => repo::list_by_food(&state.db, food_id).await?,
        None => repo::list_recent(&state.db, query.limit).await?,
    };
    Ok(Json(rows))
}
