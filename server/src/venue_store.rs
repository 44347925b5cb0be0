//! Postgres-backed venue store.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use soundcheck_core::{VenueRecord, VenueStore, VenueStoreError};

/// Venue persistence on the shared Postgres pool.
#[derive(Clone)]
pub struct PgVenueStore {
    pool: PgPool,
}

impl PgVenueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct VenueRow {
    id: Uuid,
    name: String,
    google_place_id: Option<String>,
}

impl From<VenueRow> for VenueRecord {
    fn from(row: VenueRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            place_id: row.google_place_id,
        }
    }
}

#[async_trait]
impl VenueStore for PgVenueStore {
    async fn venues_needing_photos(
        &self,
        limit: i64,
        include_photographed: bool,
    ) -> Result<Vec<VenueRecord>, VenueStoreError> {
        let rows: Vec<VenueRow> = sqlx::query_as(
            r#"
            SELECT id, name, google_place_id
            FROM venues
            WHERE google_place_id IS NOT NULL
              AND (photo_url IS NULL OR $2)
            ORDER BY name ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(include_photographed)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| VenueStoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(VenueRecord::from).collect())
    }

    async fn venue_by_id(&self, id: Uuid) -> Result<Option<VenueRecord>, VenueStoreError> {
        let row: Option<VenueRow> = sqlx::query_as(
            r#"
            SELECT id, name, google_place_id
            FROM venues
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| VenueStoreError::Query(e.to_string()))?;

        Ok(row.map(VenueRecord::from))
    }

    async fn set_photo_url(&self, id: Uuid, url: &str) -> Result<(), VenueStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE venues
            SET photo_url = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(url)
        .execute(&self.pool)
        .await
        .map_err(|e| VenueStoreError::Update(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(VenueStoreError::Update(format!("no venue with id {}", id)));
        }
        Ok(())
    }
}
