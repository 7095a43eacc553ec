use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum UpdateAction {
    Create,
    Update,
    Delete,
}

/// Append-only audit row. References go NULL when the user or food is
/// deleted; the snapshots keep the history readable regardless.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodUpdate {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub food_id: Option<Uuid>,
    pub action: UpdateAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, user_id, food_id, action, old_value, new_value, created_at";

/// Insert within the same transaction as the food write it describes.
pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Option<Uuid>,
    food_id: Uuid,
    action: UpdateAction,
    old_value: Option<&str>,
    new_value: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO food_updates (id, user_id, food_id, action, old_value, new_value)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(food_id)
    .bind(action)
    .bind(old_value)
    .bind(new_value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Most recent audit rows, newest first.
pub async fn list_recent(db: &PgPool, limit: i64) -> anyhow::Result<Vec<FoodUpdate>> {
    let rows = sqlx::query_as::<_, FoodUpdate>(&format!(
        "SELECT {COLUMNS} FROM food_updates ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_by_food(db: &PgPool, food_id: Uuid) -> anyhow::Result<Vec<FoodUpdate>> {
    let rows = sqlx::query_as::<_, FoodUpdate>(&format!(
        "SELECT {COLUMNS} FROM food_updates WHERE food_id = $1 ORDER BY created_at DESC"
    ))
    .bind(food_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
