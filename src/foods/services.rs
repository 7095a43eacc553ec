use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

use crate::categories;
use crate::docs::FoodMirror;
use crate::error::AppError;
use crate::state::AppState;
use crate::updates;
use crate::updates::repo::UpdateAction;
use crate::users;

use super::dto::FoodRequest;
use super::repo::{self, FoodItem};

/// Create a food and its audit row in one transaction, then mirror.
pub async fn create_food(state: &AppState, payload: &FoodRequest) -> Result<FoodItem, AppError> {
    let category = categories::repo::find_by_id(&state.db, payload.category_id)
        .await?
        .ok_or(AppError::NotFound("category"))?;
    if let Some(user_id) = payload.user_id {
        users::repo::find_by_id(&state.db, user_id)
            .await?
            .ok_or(AppError::NotFound("user"))?;
    }

    let mut tx = state.db.begin().await.context("begin tx")?;
    let food = repo::insert_tx(&mut tx, &payload.fields()).await?;
    let new_value = snapshot(&food)?;
    updates::repo::insert_tx(
        &mut tx,
        payload.actor_id,
        food.id,
        UpdateAction::Create,
        None,
        Some(&new_value),
    )
    .await?;
    tx.commit().await.context("commit tx")?;

    info!(food_id = %food.id, name = %food.name, "food created");
    mirror_upsert(state, &food, &category.name).await;
    Ok(food)
}

pub async fn update_food(
    state: &AppState,
    id: Uuid,
    payload: &FoodRequest,
) -> Result<FoodItem, AppError> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("food"))?;
    let category = categories::repo::find_by_id(&state.db, payload.category_id)
        .await?
        .ok_or(AppError::NotFound("category"))?;
    if let Some(user_id) = payload.user_id {
        users::repo::find_by_id(&state.db, user_id)
            .await?
            .ok_or(AppError::NotFound("user"))?;
    }

    let old_value = snapshot(&existing)?;
    let mut tx = state.db.begin().await.context("begin tx")?;
    let food = repo::update_tx(&mut tx, id, &payload.fields()).await?;
    let new_value = snapshot(&food)?;
    updates::repo::insert_tx(
        &mut tx,
        payload.actor_id,
        food.id,
        UpdateAction::Update,
        Some(&old_value),
        Some(&new_value),
    )
    .await?;
    tx.commit().await.context("commit tx")?;

    mirror_upsert(state, &food, &category.name).await;
    Ok(food)
}

/// Delete a food, keeping an audit row with the final snapshot. The mirror
/// document and any hosted image are cleaned up best effort afterwards.
pub async fn delete_food(
    state: &AppState,
    id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<(), AppError> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("food"))?;

    let old_value = snapshot(&existing)?;
    let mut tx = state.db.begin().await.context("begin tx")?;
    updates::repo::insert_tx(
        &mut tx,
        actor_id,
        id,
        UpdateAction::Delete,
        Some(&old_value),
        None,
    )
    .await?;
    repo::delete_tx(&mut tx, id).await?;
    tx.commit().await.context("commit tx")?;

    info!(food_id = %id, name = %existing.name, "food deleted");

    if let Some(docs) = &state.docs {
        if let Err(e) = docs.delete_food(&id.to_string()).await {
            warn!(error = %e, food_id = %id, "food mirror delete failed");
        }
    }
    if let (Some(storage), Some(image)) = (&state.storage, &existing.image_url) {
        // Full URLs are hosted elsewhere; only bare object keys are ours.
        if !image.starts_with("http") {
            if let Err(e) = storage.delete_object(image).await {
                warn!(error = %e, food_id = %id, key = %image, "image delete failed");
            }
        }
    }
    Ok(())
}

fn snapshot(food: &FoodItem) -> Result<String, AppError> {
    let json = serde_json::to_string(food).context("serialize food snapshot")?;
    Ok(json)
}

async fn mirror_upsert(state: &AppState, food: &FoodItem, category_name: &str) {
    let Some(docs) = &state.docs else { return };
    let mirror = FoodMirror {
        id: food.id.to_string(),
        name: food.name.clone(),
        calories: food.calories.clone(),
        description: food.description.clone(),
        image_url: food.image_url.clone(),
        category_id: food.category_id.to_string(),
        category_name: category_name.to_string(),
        available: food.available,
        rating: food.rating,
        review_count: food.review_count as i64,
        unit: food.unit.clone(),
    };
    if let Err(e) = docs.upsert_food(&mirror).await {
        warn!(error = %e, food_id = %food.id, "food mirror write failed");
    }
}
