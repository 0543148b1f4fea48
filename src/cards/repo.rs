use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

pub const STATUS_UNACTIVATED: &str = "unactivated";
pub const STATUS_ACTIVATED: &str = "activated";

/// A pre-provisioned NFC/QR card. Lifecycle is strictly
/// `unactivated -> activated -> unactivated` (via unlink); once activated,
/// its profile binding is authoritative for the QR redirect until explicitly
/// unlinked.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhysicalCard {
    pub id: Uuid,
    pub code: String,
    pub status: String,
    pub user_id: Option<Uuid>,
    pub profile_id: Option<Uuid>,
    pub batch_name: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub activated_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const CARD_COLUMNS: &str =
    "id, code, status, user_id, profile_id, batch_name, activated_at, created_at";

/// Printable card code: `FC` plus 8 upper hex chars.
pub fn generate_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("FC{}", hex[..8].to_uppercase())
}

impl PhysicalCard {
    pub async fn create(db: &PgPool, code: &str, batch_name: Option<&str>) -> sqlx::Result<PhysicalCard> {
        sqlx::query_as::<_, PhysicalCard>(&format!(
            "INSERT INTO physical_cards (code, batch_name) VALUES ($1, $2)
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(code)
        .bind(batch_name)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<PhysicalCard>> {
        sqlx::query_as::<_, PhysicalCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM physical_cards WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_code(db: &PgPool, code: &str) -> sqlx::Result<Option<PhysicalCard>> {
        sqlx::query_as::<_, PhysicalCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM physical_cards WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(db)
        .await
    }

    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<PhysicalCard>> {
        sqlx::query_as::<_, PhysicalCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM physical_cards
             WHERE user_id = $1
             ORDER BY activated_at DESC NULLS LAST"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Guarded transition: only an unactivated card can be claimed, so two
    /// concurrent activations cannot both succeed.
    pub async fn activate(
        db: &PgPool,
        code: &str,
        user_id: Uuid,
        profile_id: Uuid,
    ) -> sqlx::Result<Option<PhysicalCard>> {
        sqlx::query_as::<_, PhysicalCard>(&format!(
            "UPDATE physical_cards
             SET status = '{STATUS_ACTIVATED}', user_id = $2, profile_id = $3, activated_at = now()
             WHERE code = $1 AND status = '{STATUS_UNACTIVATED}'
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(code)
        .bind(user_id)
        .bind(profile_id)
        .fetch_optional(db)
        .await
    }

    /// Reset to unactivated with all bindings cleared. Only the bound user
    /// may unlink; the guard is in the WHERE clause.
    pub async fn unlink(db: &PgPool, code: &str, user_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "UPDATE physical_cards
             SET status = 'unactivated', user_id = NULL, profile_id = NULL, activated_at = NULL
             WHERE code = $1 AND user_id = $2",
        )
        .bind(code)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Account deletion resets (never deletes) every card bound to the user.
    pub async fn reset_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE physical_cards
             SET status = 'unactivated', user_id = NULL, profile_id = NULL, activated_at = NULL
             WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), 10);
        assert!(code.starts_with("FC"));
        assert!(code[2..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn codes_are_unique() {
        assert_ne!(generate_code(), generate_code());
    }
}
