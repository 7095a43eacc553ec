use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, description, icon, color, created_at, updated_at";

/// All categories, name ascending.
pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories ORDER BY name ASC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(category)
}

/// Case-insensitive name lookup; names are unique.
pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE LOWER(name) = LOWER($1)"
    ))
    .bind(name)
    .fetch_optional(db)
    .await?;
    Ok(category)
}

pub async fn insert(
    db: &PgPool,
    name: &str,
    description: Option<&str>,
    icon: Option<&str>,
    color: Option<&str>,
) -> anyhow::Result<Category> {
    let category = sqlx::query_as::<_, Category>(&format!(
        r#"
        INSERT INTO categories (id, name, description, icon, color)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .bind(icon)
    .bind(color)
    .fetch_one(db)
    .await?;
    Ok(category)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
    icon: Option<&str>,
    color: Option<&str>,
) -> anyhow::Result<Category> {
    let category = sqlx::query_as::<_, Category>(&format!(
        r#"
        UPDATE categories
           SET name = $2, description = $3, icon = $4, color = $5, updated_at = now()
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(icon)
    .bind(color)
    .fetch_one(db)
    .await?;
    Ok(category)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
