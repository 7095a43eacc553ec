use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::docs::CategoryMirror;
use crate::error::AppError;
use crate::foods;
use crate::state::AppState;

use super::dto::{CategoryRequest, CategoryResponse};
use super::repo::{self, Category};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            put(update_category).get(get_category).delete(delete_category),
        )
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = repo::list(&state.db).await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("category"))?;
    Ok(Json(category.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must be non-empty".into()));
    }
    if repo::find_by_name(&state.db, name).await?.is_some() {
        return Err(AppError::Conflict("category name already exists".into()));
    }

    let category = repo::insert(
        &state.db,
        name,
        payload.description.as_deref(),
        payload.icon.as_deref(),
        payload.color.as_deref(),
    )
    .await?;

    info!(category_id = %category.id, name = %category.name, "category created");
    mirror_upsert(&state, &category).await;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must be non-empty".into()));
    }

    repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("category"))?;

    if let Some(other) = repo::find_by_name(&state.db, name).await? {
        if other.id != id {
            return Err(AppError::Conflict("category name already exists".into()));
        }
    }

    let category = repo::update(
        &state.db,
        id,
        name,
        payload.description.as_deref(),
        payload.icon.as_deref(),
        payload.color.as_deref(),
    )
    .await?;

    mirror_upsert(&state, &category).await;
    Ok(Json(category.into()))
}

/// Deletion is blocked while any food still references the category; the
/// cascade in the schema is only a backstop for out-of-band deletes.
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let category = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("category"))?;

    let food_count = foods::repo::count_by_category(&state.db, id).await?;
    if food_count > 0 {
        return Err(AppError::Conflict(format!(
            "category \"{}\" still has {food_count} food item(s)",
            category.name
        )));
    }

    repo::delete(&state.db, id).await?;
    info!(category_id = %id, name = %category.name, "category deleted");

    if let Some(docs) = &state.docs {
        if let Err(e) = docs.delete_category(&id.to_string()).await {
            warn!(error = %e, category_id = %id, "category mirror delete failed");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn mirror_upsert(state: &AppState, category: &Category) {
    let Some(docs) = &state.docs else { return };
    let mirror = CategoryMirror {
        id: category.id.to_string(),
        name: category.name.clone(),
        description: category.description.clone(),
        icon: category.icon.clone(),
        color: category.color.clone(),
    };
    if let Err(e) = docs.upsert_category(&mirror).await {
        warn!(error = %e, category_id = %category.id, "category mirror write failed");
    }
}
