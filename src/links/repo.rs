use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Link {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub kind: String,
    pub platform: Option<String>,
    pub url: String,
    pub title: String,
    pub icon: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub clicks: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const LINK_COLUMNS: &str =
    "id, profile_id, kind, platform, url, title, icon, position, is_active, clicks, created_at";

/// Explicit set of mutable link fields; position changes go through reorder.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkChanges {
    pub kind: Option<String>,
    pub platform: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

impl Link {
    pub async fn list_for_profile(
        db: &PgPool,
        profile_id: Uuid,
        active_only: bool,
    ) -> sqlx::Result<Vec<Link>> {
        sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links
             WHERE profile_id = $1 AND ($2 = FALSE OR is_active)
             ORDER BY position"
        ))
        .bind(profile_id)
        .bind(active_only)
        .fetch_all(db)
        .await
    }

    /// Appends at the end of the profile's list.
    pub async fn create(
        db: &PgPool,
        profile_id: Uuid,
        kind: &str,
        platform: Option<&str>,
        url: &str,
        title: &str,
        icon: Option<&str>,
    ) -> sqlx::Result<Link> {
        sqlx::query_as::<_, Link>(&format!(
            "INSERT INTO links (profile_id, kind, platform, url, title, icon, position)
             VALUES ($1, $2, $3, $4, $5, $6,
                     (SELECT COALESCE(MAX(position) + 1, 0) FROM links WHERE profile_id = $1))
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(profile_id)
        .bind(kind)
        .bind(platform)
        .bind(url)
        .bind(title)
        .bind(icon)
        .fetch_one(db)
        .await
    }

    pub async fn apply_changes(
        db: &PgPool,
        profile_id: Uuid,
        link_id: Uuid,
        changes: LinkChanges,
    ) -> sqlx::Result<Option<Link>> {
        sqlx::query_as::<_, Link>(&format!(
            "UPDATE links SET
                 kind = COALESCE($3, kind),
                 platform = COALESCE($4, platform),
                 url = COALESCE($5, url),
                 title = COALESCE($6, title),
                 icon = COALESCE($7, icon),
                 is_active = COALESCE($8, is_active)
             WHERE id = $2 AND profile_id = $1
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(profile_id)
        .bind(link_id)
        .bind(changes.kind)
        .bind(changes.platform)
        .bind(changes.url)
        .bind(changes.title)
        .bind(changes.icon)
        .bind(changes.is_active)
        .fetch_optional(db)
        .await
    }

    /// Returns whether a row was removed; foreign links are invisible.
    pub async fn delete(db: &PgPool, profile_id: Uuid, link_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1 AND profile_id = $2")
            .bind(link_id)
            .bind(profile_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rewrites positions to match the submitted id order, as one
    /// transaction so readers never observe a half-applied permutation.
    pub async fn reorder(db: &PgPool, profile_id: Uuid, link_ids: &[Uuid]) -> sqlx::Result<()> {
        let mut tx = db.begin().await?;
        for (index, link_id) in link_ids.iter().enumerate() {
            sqlx::query("UPDATE links SET position = $3 WHERE id = $1 AND profile_id = $2")
                .bind(link_id)
                .bind(profile_id)
                .bind(index as i32)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Relies on the database's atomic increment; no application locking.
    pub async fn increment_clicks(
        db: &PgPool,
        profile_id: Uuid,
        link_id: Uuid,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "UPDATE links SET clicks = clicks + 1 WHERE id = $1 AND profile_id = $2",
        )
        .bind(link_id)
        .bind(profile_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
