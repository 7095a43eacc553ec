use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::categories::{self, CategoryResponse};
use crate::error::AppError;
use crate::foods::{self, FoodResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FoodsQuery {
    pub category_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Read-only surface the mobile client polls for the catalog.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/foods", get(list_foods))
        .route("/foods/search", get(search_foods))
        .route("/foods/:id", get(get_food))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = categories::repo::list(&state.db).await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<FoodsQuery>,
) -> Result<Json<Vec<FoodResponse>>, AppError> {
    let foods =
        foods::repo::list(&state.db, query.category_id, query.limit, query.offset).await?;
    Ok(Json(foods.into_iter().map(FoodResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodResponse>, AppError> {
    let food = foods::repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("food"))?;
    Ok(Json(food.into()))
}

#[instrument(skip(state))]
pub async fn search_foods(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<FoodResponse>>, AppError> {
    let needle = query.q.trim();
    if needle.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let foods = foods::repo::search_by_name(&state.db, needle, query.limit).await?;
    Ok(Json(foods.into_iter().map(FoodResponse::from).collect()))
}
