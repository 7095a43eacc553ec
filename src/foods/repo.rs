use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    /// Free-text as entered by uploaders, e.g. "250 kcal per serving".
    pub calories: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub user_id: Option<Uuid>,
    pub available: bool,
    pub rating: f64,
    pub review_count: i32,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub vitamin_a: Option<f64>,
    pub vitamin_c: Option<f64>,
    pub vitamin_d: Option<f64>,
    pub unit: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Column values for an insert or full update.
#[derive(Debug, Clone)]
pub struct FoodFields {
    pub name: String,
    pub calories: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub user_id: Option<Uuid>,
    pub available: bool,
    pub rating: f64,
    pub review_count: i32,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub vitamin_a: Option<f64>,
    pub vitamin_c: Option<f64>,
    pub vitamin_d: Option<f64>,
    pub unit: Option<String>,
}

const COLUMNS: &str = "id, name, calories, description, image_url, category_id, user_id, \
     available, rating, review_count, fat, carbs, protein, cholesterol, sodium, \
     vitamin_a, vitamin_c, vitamin_d, unit, created_at, updated_at";

/// Foods newest first, optionally narrowed to one category.
pub async fn list(
    db: &PgPool,
    category_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<FoodItem>> {
    let rows = match category_id {
        Some(category_id) => {
            sqlx::query_as::<_, FoodItem>(&format!(
                "SELECT {COLUMNS} FROM food_items WHERE category_id = $1 \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
            ))
            .bind(category_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, FoodItem>(&format!(
                "SELECT {COLUMNS} FROM food_items ORDER BY created_at DESC LIMIT $1 OFFSET $2"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?
        }
    };
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<FoodItem>> {
    let food = sqlx::query_as::<_, FoodItem>(&format!(
        "SELECT {COLUMNS} FROM food_items WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(food)
}

/// Case-insensitive substring search on the name, name ascending.
pub async fn search_by_name(db: &PgPool, query: &str, limit: i64) -> anyhow::Result<Vec<FoodItem>> {
    let rows = sqlx::query_as::<_, FoodItem>(&format!(
        "SELECT {COLUMNS} FROM food_items WHERE name ILIKE '%' || $1 || '%' \
         ORDER BY name ASC LIMIT $2"
    ))
    .bind(query)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_by_category(db: &PgPool, category_id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM food_items WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    fields: &FoodFields,
) -> anyhow::Result<FoodItem> {
    let food = sqlx::query_as::<_, FoodItem>(&format!(
        r#"
        INSERT INTO food_items (id, name, calories, description, image_url, category_id,
                                user_id, available, rating, review_count, fat, carbs,
                                protein, cholesterol, sodium, vitamin_a, vitamin_c,
                                vitamin_d, unit)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&fields.name)
    .bind(&fields.calories)
    .bind(&fields.description)
    .bind(&fields.image_url)
    .bind(fields.category_id)
    .bind(fields.user_id)
    .bind(fields.available)
    .bind(fields.rating)
    .bind(fields.review_count)
    .bind(fields.fat)
    .bind(fields.carbs)
    .bind(fields.protein)
    .bind(fields.cholesterol)
    .bind(fields.sodium)
    .bind(fields.vitamin_a)
    .bind(fields.vitamin_c)
    .bind(fields.vitamin_d)
    .bind(&fields.unit)
    .fetch_one(&mut **tx)
    .await?;
    Ok(food)
}

pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    fields: &FoodFields,
) -> anyhow::Result<FoodItem> {
    let food = sqlx::query_as::<_, FoodItem>(&format!(
        r#"
        UPDATE food_items
           SET name = $2, calories = $3, description = $4, image_url = $5,
               category_id = $6, user_id = $7, available = $8, rating = $9,
               review_count = $10, fat = $11, carbs = $12, protein = $13,
               cholesterol = $14, sodium = $15, vitamin_a = $16, vitamin_c = $17,
               vitamin_d = $18, unit = $19, updated_at = now()
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&fields.name)
    .bind(&fields.calories)
    .bind(&fields.description)
    .bind(&fields.image_url)
    .bind(fields.category_id)
    .bind(fields.user_id)
    .bind(fields.available)
    .bind(fields.rating)
    .bind(fields.review_count)
    .bind(fields.fat)
    .bind(fields.carbs)
    .bind(fields.protein)
    .bind(fields.cholesterol)
    .bind(fields.sodium)
    .bind(fields.vitamin_a)
    .bind(fields.vitamin_c)
    .bind(fields.vitamin_d)
    .bind(&fields.unit)
    .fetch_one(&mut **tx)
    .await?;
    Ok(food)
}

pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM food_items WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
