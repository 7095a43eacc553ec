use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

use super::dto::{DeleteFoodRequest, FoodRequest, FoodResponse};
use super::repo;
use super::services;

#[derive(Debug, Deserialize)]
pub struct FoodListQuery {
    pub category_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/:id", put(update_food).get(get_food).delete(delete_food))
        .route("/foods/:id/image", get(get_food_image))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<FoodListQuery>,
) -> Result<Json<Vec<FoodResponse>>, AppError> {
    let foods = repo::list(&state.db, query.category_id, query.limit, query.offset).await?;
    Ok(Json(foods.into_iter().map(FoodResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodResponse>, AppError> {
    let food = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("food"))?;
    Ok(Json(food.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_food(
    State(state): State<AppState>,
    Json(payload): Json<FoodRequest>,
) -> Result<(StatusCode, Json<FoodResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must be non-empty".into()));
    }
    let food = services::create_food(&state, &payload).await?;
    Ok((StatusCode::CREATED, Json(food.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FoodRequest>,
) -> Result<Json<FoodResponse>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must be non-empty".into()));
    }
    let food = services::update_food(&state, id, &payload).await?;
    Ok(Json(food.into()))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteFoodRequest>,
) -> Result<StatusCode, AppError> {
    services::delete_food(&state, id, query.actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 302 to the food's image: full URLs redirect as-is, bare object keys are
/// presigned against the configured bucket.
#[instrument(skip(state))]
pub async fn get_food_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let food = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("food"))?;
    let image = food.image_url.ok_or(AppError::NotFound("image"))?;

    if image.starts_with("http") {
        return Ok(Redirect::temporary(&image));
    }
    let storage = state
        .storage
        .as_ref()
        .ok_or(AppError::Unavailable("image storage"))?;
    let url = storage.presign_get(&image, 600).await?;
    Ok(Redirect::temporary(&url))
}
