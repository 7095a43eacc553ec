use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Ensure the four tables exist. Runs at every start; each statement is
/// `IF NOT EXISTS` so an already-provisioned database is left untouched.
/// Statements are ordered so foreign keys always point at existing tables.
pub async fn ensure_schema(db: &PgPool) -> anyhow::Result<()> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            UUID PRIMARY KEY,
            username      TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            full_name     TEXT NOT NULL,
            avatar_url    TEXT,
            role          TEXT NOT NULL DEFAULT 'USER',
            created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id          UUID PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            description TEXT,
            icon        TEXT,
            color       TEXT,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS food_items (
            id           UUID PRIMARY KEY,
            name         TEXT NOT NULL,
            calories     TEXT NOT NULL,
            description  TEXT,
            image_url    TEXT,
            category_id  UUID NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            user_id      UUID REFERENCES users(id) ON DELETE SET NULL,
            available    BOOLEAN NOT NULL DEFAULT TRUE,
            rating       DOUBLE PRECISION NOT NULL DEFAULT 0,
            review_count INTEGER NOT NULL DEFAULT 0,
            fat          DOUBLE PRECISION,
            carbs        DOUBLE PRECISION,
            protein      DOUBLE PRECISION,
            cholesterol  DOUBLE PRECISION,
            sodium       DOUBLE PRECISION,
            vitamin_a    DOUBLE PRECISION,
            vitamin_c    DOUBLE PRECISION,
            vitamin_d    DOUBLE PRECISION,
            unit         TEXT,
            created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at   TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
        // Audit rows must outlive the user/food they describe, so the
        // references go NULL on delete instead of cascading.
        r#"
        CREATE TABLE IF NOT EXISTS food_updates (
            id         UUID PRIMARY KEY,
            user_id    UUID REFERENCES users(id) ON DELETE SET NULL,
            food_id    UUID REFERENCES food_items(id) ON DELETE SET NULL,
            action     TEXT NOT NULL,
            old_value  TEXT,
            new_value  TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ];

    for ddl in statements {
        sqlx::query(ddl)
            .execute(db)
            .await
            .context("ensure schema")?;
    }
    Ok(())
}
