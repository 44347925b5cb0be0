//! Database pool and schema setup.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a connection pool for the given database URL.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Create the venues table and its indexes if they do not exist yet.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venues (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            google_place_id TEXT,
            photo_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Backfill selection scans unphotographed venues by name.
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS venues_needing_photo_idx
        ON venues (name)
        WHERE photo_url IS NULL
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
