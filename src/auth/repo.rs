use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::token::generate_token;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub auth_type: String,
    #[serde(skip_serializing)]
    pub supabase_user_id: Option<String>,
    pub picture: Option<String>,
    pub email_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, email, name, password_hash, auth_type, supabase_user_id, \
                            picture, email_verified, created_at, updated_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_supabase_id(db: &PgPool, sub: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE supabase_user_id = $1"
        ))
        .bind(sub)
        .fetch_optional(db)
        .await
    }

    pub async fn create_local(
        db: &PgPool,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name, password_hash, auth_type)
             VALUES ($1, $2, $3, 'email')
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// First external login creates the account; later logins refresh the
    /// display name and picture from the provider.
    pub async fn upsert_external(
        db: &PgPool,
        email: &str,
        name: &str,
        picture: Option<&str>,
        auth_type: &str,
        supabase_user_id: Option<&str>,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name, picture, auth_type, supabase_user_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (email) DO UPDATE
                 SET name = EXCLUDED.name,
                     picture = EXCLUDED.picture,
                     updated_at = now()
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(picture)
        .bind(auth_type)
        .bind(supabase_user_id)
        .fetch_one(db)
        .await
    }

    pub async fn set_password(db: &PgPool, user_id: Uuid, hash: &str) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(hash)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn mark_email_verified(db: &PgPool, user_id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Cascades to profile, links, contacts, analytics, sessions and tokens.
    /// Physical cards are reset by the caller beforehand, never deleted.
    pub async fn delete(db: &PgPool, user_id: Uuid) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub async fn create(db: &PgPool, user_id: Uuid, ttl_days: i64) -> sqlx::Result<Session> {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + Duration::days(ttl_days);
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (user_id, token, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, token, created_at, expires_at",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(db)
        .await
    }

    /// Exact-match lookup; expired rows are treated as absent.
    pub async fn find_valid(db: &PgPool, token: &str) -> sqlx::Result<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT id, user_id, token, created_at, expires_at
             FROM sessions
             WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    pub async fn delete_by_token(db: &PgPool, token: &str) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// Single-use tokens for password reset (1 hour) and email verification
/// (24 hours). Same shape, different table.
#[derive(Debug, Clone, FromRow)]
pub struct OneTimeToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub used: bool,
    pub created_at: OffsetDateTime,
}

pub struct PasswordResetToken;
pub struct EmailVerificationToken;

impl PasswordResetToken {
    pub const TTL_HOURS: i64 = 1;

    pub async fn create(db: &PgPool, user_id: Uuid) -> sqlx::Result<OneTimeToken> {
        create_one_time_token(db, "password_reset_tokens", user_id, Self::TTL_HOURS).await
    }

    pub async fn find_valid(db: &PgPool, token: &str) -> sqlx::Result<Option<OneTimeToken>> {
        find_valid_one_time_token(db, "password_reset_tokens", token).await
    }

    pub async fn mark_used(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        mark_one_time_token_used(db, "password_reset_tokens", id).await
    }
}

impl EmailVerificationToken {
    pub const TTL_HOURS: i64 = 24;

    pub async fn create(db: &PgPool, user_id: Uuid) -> sqlx::Result<OneTimeToken> {
        create_one_time_token(db, "email_verification_tokens", user_id, Self::TTL_HOURS).await
    }

    pub async fn find_valid(db: &PgPool, token: &str) -> sqlx::Result<Option<OneTimeToken>> {
        find_valid_one_time_token(db, "email_verification_tokens", token).await
    }

    pub async fn mark_used(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        mark_one_time_token_used(db, "email_verification_tokens", id).await
    }
}

async fn create_one_time_token(
    db: &PgPool,
    table: &str,
    user_id: Uuid,
    ttl_hours: i64,
) -> sqlx::Result<OneTimeToken> {
    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::hours(ttl_hours);
    sqlx::query_as::<_, OneTimeToken>(&format!(
        "INSERT INTO {table} (user_id, token, expires_at)
         VALUES ($1, $2, $3)
         RETURNING id, user_id, token, expires_at, used, created_at"
    ))
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .fetch_one(db)
    .await
}

async fn find_valid_one_time_token(
    db: &PgPool,
    table: &str,
    token: &str,
) -> sqlx::Result<Option<OneTimeToken>> {
    sqlx::query_as::<_, OneTimeToken>(&format!(
        "SELECT id, user_id, token, expires_at, used, created_at
         FROM {table}
         WHERE token = $1 AND used = FALSE AND expires_at > now()"
    ))
    .bind(token)
    .fetch_optional(db)
    .await
}

async fn mark_one_time_token_used(db: &PgPool, table: &str, id: Uuid) -> sqlx::Result<()> {
    sqlx::query(&format!("UPDATE {table} SET used = TRUE WHERE id = $1"))
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
