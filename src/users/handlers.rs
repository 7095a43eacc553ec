use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::docs::UserMirror;
use crate::error::AppError;
use crate::state::AppState;

use super::dto::{CreateUserRequest, UpdateUserRequest, UserResponse};
use super::password::hash_password;
use super::repo::{self, Role, User};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).get(get_user).delete(delete_user))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = repo::list(&state.db).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if payload.username.is_empty() {
        return Err(AppError::BadRequest("username must be non-empty".into()));
    }
    if !is_valid_email(&payload.email) {
        return Err(AppError::BadRequest("invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(AppError::BadRequest("password too short".into()));
    }

    // Ensure username and email are not taken
    if repo::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("username already taken".into()));
    }
    if repo::find_by_email(&state.db, &payload.email).await?.is_some() {
        return Err(AppError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = repo::insert(
        &state.db,
        &payload.username,
        &hash,
        &payload.email,
        &payload.full_name,
        payload.avatar_url.as_deref(),
        payload.role,
    )
    .await?;

    info!(user_id = %user.id, username = %user.username, "user created");
    mirror_upsert(&state, &user).await;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        return Err(AppError::BadRequest("invalid email".into()));
    }

    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    if payload.email != existing.email {
        if let Some(other) = repo::find_by_email(&state.db, &payload.email).await? {
            if other.id != id {
                return Err(AppError::Conflict("email already registered".into()));
            }
        }
    }

    if let Some(password) = &payload.password {
        if password.len() < 8 {
            return Err(AppError::BadRequest("password too short".into()));
        }
        let hash = hash_password(password)?;
        repo::update_password(&state.db, id, &hash).await?;
    }

    let user = repo::update(
        &state.db,
        id,
        &payload.email,
        &payload.full_name,
        payload.avatar_url.as_deref(),
        payload.role,
    )
    .await?;

    mirror_upsert(&state, &user).await;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    if user.role == Role::Admin {
        return Err(AppError::Conflict(
            "administrator accounts cannot be deleted".into(),
        ));
    }

    repo::delete(&state.db, id).await?;
    info!(user_id = %id, username = %user.username, "user deleted");

    if let Some(docs) = &state.docs {
        if let Err(e) = docs.delete_user(&id.to_string()).await {
            warn!(error = %e, user_id = %id, "user mirror delete failed");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Best-effort mirror write; the primary row is already committed and is
/// never rolled back over a mirror failure.
async fn mirror_upsert(state: &AppState, user: &User) {
    let Some(docs) = &state.docs else { return };
    let mirror = UserMirror {
        id: user.id.to_string(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        avatar_url: user.avatar_url.clone(),
    };
    if let Err(e) = docs.upsert_user(&mirror).await {
        warn!(error = %e, user_id = %user.id, "user mirror write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ann@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("ann@nodot"));
    }
}
