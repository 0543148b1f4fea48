use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One entry of a profile's contact list (ordered, may be empty).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub cover_color: String,
    pub cover_type: String,
    pub website: Option<String>,
    pub location: Option<String>,
    pub emails: Json<Vec<ContactInfo>>,
    pub phones: Json<Vec<ContactInfo>>,
    pub theme: String,
    pub primary_color: String,
    pub background_style: String,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const PROFILE_COLUMNS: &str = "id, user_id, username, first_name, last_name, title, company, \
     bio, avatar, cover_image, cover_color, cover_type, website, location, emails, phones, \
     theme, primary_color, background_style, views, created_at, updated_at";

/// An absent key leaves the column untouched. Keeps "key present with
/// null" distinguishable from "key absent" on the nullable columns, so an
/// explicit null clears them. Unknown keys are rejected at deserialization.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

/// Explicit set of mutable profile fields. Nullable columns are two-level:
/// outer `None` means untouched, `Some(None)` means set to NULL.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileChanges {
    #[serde(default, deserialize_with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cover_image: Option<Option<String>>,
    pub cover_color: Option<String>,
    pub cover_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub emails: Option<Vec<ContactInfo>>,
    pub phones: Option<Vec<ContactInfo>>,
    pub theme: Option<String>,
    pub primary_color: Option<String>,
    pub background_style: Option<String>,
}

impl Profile {
    pub async fn find_by_user_id(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn username_taken(
        db: &PgPool,
        username: &str,
        exclude_user: Option<Uuid>,
    ) -> sqlx::Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM profiles WHERE username = $1 AND ($2::uuid IS NULL OR user_id != $2)",
        )
        .bind(username)
        .bind(exclude_user)
        .fetch_optional(db)
        .await?;
        Ok(row.is_some())
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        username: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        avatar: Option<&str>,
        emails: Vec<ContactInfo>,
    ) -> sqlx::Result<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "INSERT INTO profiles (user_id, username, first_name, last_name, avatar, emails)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(avatar)
        .bind(Json(emails))
        .fetch_one(db)
        .await
    }

    /// Nullable columns take a presence flag plus a value so an explicit
    /// null can clear them; NOT NULL columns keep plain COALESCE.
    pub async fn apply_changes(
        db: &PgPool,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET
                 first_name = CASE WHEN $2 THEN $3 ELSE first_name END,
                 last_name = CASE WHEN $4 THEN $5 ELSE last_name END,
                 title = CASE WHEN $6 THEN $7 ELSE title END,
                 company = CASE WHEN $8 THEN $9 ELSE company END,
                 bio = CASE WHEN $10 THEN $11 ELSE bio END,
                 avatar = CASE WHEN $12 THEN $13 ELSE avatar END,
                 cover_image = CASE WHEN $14 THEN $15 ELSE cover_image END,
                 website = CASE WHEN $16 THEN $17 ELSE website END,
                 location = CASE WHEN $18 THEN $19 ELSE location END,
                 cover_color = COALESCE($20, cover_color),
                 cover_type = COALESCE($21, cover_type),
                 emails = COALESCE($22, emails),
                 phones = COALESCE($23, phones),
                 theme = COALESCE($24, theme),
                 primary_color = COALESCE($25, primary_color),
                 background_style = COALESCE($26, background_style),
                 updated_at = now()
             WHERE user_id = $1
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(changes.first_name.is_some())
        .bind(changes.first_name.flatten())
        .bind(changes.last_name.is_some())
        .bind(changes.last_name.flatten())
        .bind(changes.title.is_some())
        .bind(changes.title.flatten())
        .bind(changes.company.is_some())
        .bind(changes.company.flatten())
        .bind(changes.bio.is_some())
        .bind(changes.bio.flatten())
        .bind(changes.avatar.is_some())
        .bind(changes.avatar.flatten())
        .bind(changes.cover_image.is_some())
        .bind(changes.cover_image.flatten())
        .bind(changes.website.is_some())
        .bind(changes.website.flatten())
        .bind(changes.location.is_some())
        .bind(changes.location.flatten())
        .bind(changes.cover_color)
        .bind(changes.cover_type)
        .bind(changes.emails.map(Json))
        .bind(changes.phones.map(Json))
        .bind(changes.theme)
        .bind(changes.primary_color)
        .bind(changes.background_style)
        .fetch_optional(db)
        .await
    }

    pub async fn set_username(
        db: &PgPool,
        user_id: Uuid,
        username: &str,
    ) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET username = $2, updated_at = now()
             WHERE user_id = $1
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn set_avatar(
        db: &PgPool,
        user_id: Uuid,
        avatar: Option<&str>,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE profiles SET avatar = $2, updated_at = now() WHERE user_id = $1")
            .bind(user_id)
            .bind(avatar)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_cover_image(
        db: &PgPool,
        user_id: Uuid,
        cover_image: Option<&str>,
    ) -> sqlx::Result<()> {
        // Switching the image also switches the cover mode.
        sqlx::query(
            "UPDATE profiles
             SET cover_image = $2,
                 cover_type = CASE WHEN $2::text IS NULL THEN 'color' ELSE 'image' END,
                 updated_at = now()
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(cover_image)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Relies on the database's atomic increment; no application locking.
    pub async fn increment_views(db: &PgPool, profile_id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE profiles SET views = views + 1 WHERE id = $1")
            .bind(profile_id)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// Deterministic username candidate: email local-part, lowercased,
/// non-alphanumerics stripped, truncated to 20 chars.
pub fn candidate_username(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let cleaned: String = local
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(20)
        .collect();
    if cleaned.is_empty() {
        "user".to_string()
    } else {
        cleaned
    }
}

fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..4].to_string()
}

/// Provision the 1:1 profile created alongside an account. One probe on the
/// derived candidate, then a few suffixed retries.
pub async fn provision_profile(
    db: &PgPool,
    user_id: Uuid,
    email: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
    avatar: Option<&str>,
) -> sqlx::Result<Profile> {
    let emails = vec![ContactInfo {
        kind: "email".into(),
        value: email.to_string(),
        label: Some("Principal".into()),
    }];

    let candidate = candidate_username(email);
    let mut username = candidate.clone();
    for attempt in 0..4 {
        if Profile::username_taken(db, &username, None).await? {
            username = format!("{candidate}{}", random_suffix());
            continue;
        }
        match Profile::create(
            db,
            user_id,
            &username,
            first_name,
            last_name,
            avatar,
            emails.clone(),
        )
        .await
        {
            Ok(profile) => return Ok(profile),
            // Lost a race on the unique index; retry with a fresh suffix.
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some("23505") && attempt < 3 =>
            {
                username = format!("{candidate}{}", random_suffix());
            }
            Err(e) => return Err(e),
        }
    }
    Profile::create(db, user_id, &username, first_name, last_name, avatar, emails).await
}

/// Split a display name into first/last the way the signup form expects.
pub fn split_name(name: &str) -> (Option<String>, Option<String>) {
    let mut parts = name.trim().splitn(2, ' ');
    let first = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    let last = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_strips_and_lowercases() {
        assert_eq!(candidate_username("Jane.Doe+test@example.com"), "janedoetest");
        assert_eq!(candidate_username("john_smith@corp.io"), "johnsmith");
    }

    #[test]
    fn candidate_truncates_to_twenty() {
        let name = candidate_username("averyveryverylongemailaddress@example.com");
        assert_eq!(name.len(), 20);
        assert_eq!(name, "averyveryverylongema");
    }

    #[test]
    fn candidate_falls_back_when_empty() {
        assert_eq!(candidate_username("+.-@example.com"), "user");
        assert_eq!(candidate_username(""), "user");
    }

    #[test]
    fn candidate_is_alphanumeric_lowercase() {
        let name = candidate_username("Crème.Brûlée@pâtisserie.fr");
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(name, name.to_lowercase());
    }

    #[test]
    fn suffix_is_four_hex_chars() {
        let s = random_suffix();
        assert_eq!(s.len(), 4);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn split_name_handles_single_and_double() {
        assert_eq!(
            split_name("Jane Doe"),
            (Some("Jane".into()), Some("Doe".into()))
        );
        assert_eq!(split_name("Prince"), (Some("Prince".into()), None));
        assert_eq!(
            split_name("Ana de la Cruz"),
            (Some("Ana".into()), Some("de la Cruz".into()))
        );
        assert_eq!(split_name(""), (None, None));
    }

    #[test]
    fn profile_changes_rejects_unknown_fields() {
        let err = serde_json::from_str::<ProfileChanges>(r#"{"username": "hijack"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn absent_null_and_value_are_three_different_changes() {
        let absent: ProfileChanges = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.bio, None);

        let cleared: ProfileChanges = serde_json::from_str(r#"{"bio": null}"#).unwrap();
        assert_eq!(cleared.bio, Some(None));

        let set: ProfileChanges = serde_json::from_str(r#"{"bio": "Hi there"}"#).unwrap();
        assert_eq!(set.bio, Some(Some("Hi there".to_string())));
    }

    #[test]
    fn explicit_null_clears_only_nullable_fields() {
        // NOT NULL columns keep single-level options; null there collapses
        // to "untouched" instead of clearing.
        let changes: ProfileChanges =
            serde_json::from_str(r#"{"website": null, "cover_image": null, "theme": null}"#)
                .unwrap();
        assert_eq!(changes.website, Some(None));
        assert_eq!(changes.cover_image, Some(None));
        assert_eq!(changes.theme, None);
    }

    #[test]
    fn contact_info_uses_type_key() {
        let ci: ContactInfo =
            serde_json::from_str(r#"{"type":"email","value":"a@b.c","label":"Pro"}"#).unwrap();
        assert_eq!(ci.kind, "email");
        let json = serde_json::to_string(&ci).unwrap();
        assert!(json.contains(r#""type":"email""#));
    }
}
