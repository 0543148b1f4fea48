use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::dto::MessageResponse;
use crate::auth::extractors::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::profiles::repo::Profile;
use crate::state::AppState;

use super::storage;

#[derive(Debug, Deserialize)]
pub struct UploadImageRequest {
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    pub url: String,
}

async fn replace_image(
    state: &AppState,
    user_id: uuid::Uuid,
    kind: &str,
    previous: Option<&str>,
    payload: &str,
) -> ApiResult<String> {
    let bytes = storage::decode_image(payload)?;
    let url = storage::store_image(&state.config.uploads_dir, kind, user_id, &bytes).await?;
    if let Some(old) = previous {
        if let Err(e) = storage::remove_uploaded_file(&state.config.uploads_dir, old).await {
            tracing::warn!(error = %e, "Failed to remove replaced upload");
        }
    }
    Ok(url)
}

async fn own_profile(state: &AppState, user_id: uuid::Uuid) -> ApiResult<Profile> {
    Profile::find_by_user_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.0.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<UploadImageRequest>,
) -> ApiResult<Json<UploadImageResponse>> {
    let profile = own_profile(&state, user.0.id).await?;
    let url = replace_image(
        &state,
        user.0.id,
        "avatar",
        profile.avatar.as_deref(),
        &payload.image,
    )
    .await?;
    Profile::set_avatar(&state.db, user.0.id, Some(&url)).await?;
    Ok(Json(UploadImageResponse { url }))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn delete_avatar(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    let profile = own_profile(&state, user.0.id).await?;
    if let Some(avatar) = profile.avatar.as_deref() {
        if let Err(e) = storage::remove_uploaded_file(&state.config.uploads_dir, avatar).await {
            tracing::warn!(error = %e, "Failed to remove avatar file");
        }
    }
    Profile::set_avatar(&state.db, user.0.id, None).await?;
    Ok(Json(MessageResponse::new("Avatar removed")))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.0.id))]
pub async fn upload_cover(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<UploadImageRequest>,
) -> ApiResult<Json<UploadImageResponse>> {
    let profile = own_profile(&state, user.0.id).await?;
    let url = replace_image(
        &state,
        user.0.id,
        "cover",
        profile.cover_image.as_deref(),
        &payload.image,
    )
    .await?;
    Profile::set_cover_image(&state.db, user.0.id, Some(&url)).await?;
    Ok(Json(UploadImageResponse { url }))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn delete_cover(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    let profile = own_profile(&state, user.0.id).await?;
    if let Some(cover) = profile.cover_image.as_deref() {
        if let Err(e) = storage::remove_uploaded_file(&state.config.uploads_dir, cover).await {
            tracing::warn!(error = %e, "Failed to remove cover file");
        }
    }
    Profile::set_cover_image(&state.db, user.0.id, None).await?;
    Ok(Json(MessageResponse::new("Cover removed")))
}
