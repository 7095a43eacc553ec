use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::docs::{DocumentStore, Post, Review, UserRecipe};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/content/posts", get(list_posts))
        .route("/content/posts/:id", delete(delete_post))
        .route("/content/reviews", get(list_reviews))
        .route("/content/reviews/:id", delete(delete_review))
        .route("/content/recipes", get(list_recipes))
        .route("/content/recipes/:id", delete(delete_recipe))
}

fn docs_or_unavailable(state: &AppState) -> Result<&dyn DocumentStore, AppError> {
    state
        .docs
        .as_deref()
        .ok_or(AppError::Unavailable("document store"))
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let Some(docs) = &state.docs else {
        return Ok(Json(Vec::new()));
    };
    match docs.list_posts().await {
        Ok(posts) => Ok(Json(posts)),
        Err(e) => {
            warn!(error = %e, "posts unavailable");
            Ok(Json(Vec::new()))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Review>>, AppError> {
    let Some(docs) = &state.docs else {
        return Ok(Json(Vec::new()));
    };
    match docs.list_reviews().await {
        Ok(reviews) => Ok(Json(reviews)),
        Err(e) => {
            warn!(error = %e, "reviews unavailable");
            Ok(Json(Vec::new()))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserRecipe>>, AppError> {
    let Some(docs) = &state.docs else {
        return Ok(Json(Vec::new()));
    };
    match docs.list_recipes().await {
        Ok(recipes) => Ok(Json(recipes)),
        Err(e) => {
            warn!(error = %e, "recipes unavailable");
            Ok(Json(Vec::new()))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let docs = docs_or_unavailable(&state)?;
    docs.soft_delete_post(&id).await?;
    info!(post_id = %id, "post soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let docs = docs_or_unavailable(&state)?;
    docs.soft_delete_review(&id).await?;
    info!(review_id = %id, "review soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let docs = docs_or_unavailable(&state)?;
    docs.soft_delete_recipe(&id).await?;
    info!(recipe_id = %id, "recipe soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
