use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{dto::MessageResponse, extractors::CurrentUser, repo::User, token::logout_cookie},
    cards::repo::PhysicalCard,
    error::{ApiError, ApiResult},
    profiles::{
        dto::{normalize_username, validate_username, UpdateUsernameRequest},
        repo::{Profile, ProfileChanges},
    },
    state::AppState,
    uploads::storage,
};

#[instrument(skip(state, user))]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Profile>> {
    let profile = Profile::find_by_user_id(&state.db, user.id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;
    Ok(Json(profile))
}

#[instrument(skip(state, user, changes))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(changes): Json<ProfileChanges>,
) -> ApiResult<Json<Profile>> {
    let profile = Profile::apply_changes(&state.db, user.id, changes)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;
    Ok(Json(profile))
}

#[instrument(skip(state, user, payload))]
pub async fn update_username(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateUsernameRequest>,
) -> ApiResult<Json<Profile>> {
    let username = normalize_username(&payload.username);
    validate_username(&username).map_err(|msg| ApiError::Validation(msg.into()))?;

    if Profile::username_taken(&state.db, &username, Some(user.id)).await? {
        return Err(ApiError::Conflict("Username already taken".into()));
    }

    let profile = Profile::set_username(&state.db, user.id, &username)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    info!(user_id = %user.id, %username, "username updated");
    Ok(Json(profile))
}

/// Full account deletion. Cascades through the schema; physical cards are
/// reset to unactivated, and any uploaded images are removed from disk.
#[instrument(skip(state, jar, user))]
pub async fn delete_account(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentUser(user): CurrentUser,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(profile) = Profile::find_by_user_id(&state.db, user.id).await? {
        for path in [profile.avatar.as_deref(), profile.cover_image.as_deref()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = storage::remove_uploaded_file(&state.config.uploads_dir, path).await {
                warn!(error = %e, path, "failed to remove uploaded file");
            }
        }
    }

    PhysicalCard::reset_for_user(&state.db, user.id).await?;
    User::delete(&state.db, user.id).await?;

    info!(user_id = %user.id, "account deleted");
    Ok((
        jar.add(logout_cookie()),
        Json(MessageResponse::new("Profile and account deleted")),
    ))
}
