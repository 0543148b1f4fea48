use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// An inbound lead captured on the public profile. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const CONTACT_COLUMNS: &str = "id, profile_id, name, email, phone, message, source, created_at";

impl Contact {
    pub async fn create(
        db: &PgPool,
        profile_id: Uuid,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        message: Option<&str>,
        source: &str,
    ) -> sqlx::Result<Contact> {
        sqlx::query_as::<_, Contact>(&format!(
            "INSERT INTO contacts (profile_id, name, email, phone, message, source)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(profile_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(message)
        .bind(source)
        .fetch_one(db)
        .await
    }

    pub async fn list_for_profile(db: &PgPool, profile_id: Uuid) -> sqlx::Result<Vec<Contact>> {
        sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             WHERE profile_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(profile_id)
        .fetch_all(db)
        .await
    }

    pub async fn delete(db: &PgPool, profile_id: Uuid, contact_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND profile_id = $2")
            .bind(contact_id)
            .bind(profile_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_profile(db: &PgPool, profile_id: Uuid) -> sqlx::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE profile_id = $1")
                .bind(profile_id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }
}
