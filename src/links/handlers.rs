use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, extractors::CurrentUser},
    error::{ApiError, ApiResult},
    links::{
        dto::{CreateLinkRequest, ReorderRequest},
        repo::{Link, LinkChanges},
    },
    profiles::repo::Profile,
    state::AppState,
};

async fn own_profile(db: &PgPool, user_id: Uuid) -> ApiResult<Profile> {
    Profile::find_by_user_id(db, user_id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))
}

#[instrument(skip(state, user))]
pub async fn list_links(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Link>>> {
    let profile = own_profile(&state.db, user.id).await?;
    let links = Link::list_for_profile(&state.db, profile.id, false).await?;
    Ok(Json(links))
}

#[instrument(skip(state, user, payload))]
pub async fn create_link(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateLinkRequest>,
) -> ApiResult<Json<Link>> {
    if payload.url.trim().is_empty() {
        return Err(ApiError::Validation("url is required".into()));
    }
    let title = payload
        .display_title()
        .ok_or_else(|| ApiError::Validation("title or platform is required".into()))?;

    let profile = own_profile(&state.db, user.id).await?;
    let link = Link::create(
        &state.db,
        profile.id,
        &payload.kind,
        payload.platform.as_deref(),
        payload.url.trim(),
        &title,
        payload.icon.as_deref(),
    )
    .await?;

    info!(link_id = %link.id, profile_id = %profile.id, "link created");
    Ok(Json(link))
}

#[instrument(skip(state, user, changes))]
pub async fn update_link(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(link_id): Path<Uuid>,
    Json(changes): Json<LinkChanges>,
) -> ApiResult<Json<Link>> {
    let profile = own_profile(&state.db, user.id).await?;
    let link = Link::apply_changes(&state.db, profile.id, link_id, changes)
        .await?
        .ok_or(ApiError::NotFound("Link not found"))?;
    Ok(Json(link))
}

#[instrument(skip(state, user))]
pub async fn delete_link(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(link_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let profile = own_profile(&state.db, user.id).await?;
    if !Link::delete(&state.db, profile.id, link_id).await? {
        return Err(ApiError::NotFound("Link not found"));
    }
    info!(%link_id, "link deleted");
    Ok(Json(MessageResponse::new("Link deleted")))
}

#[instrument(skip(state, user, payload))]
pub async fn reorder_links(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<Link>>> {
    let profile = own_profile(&state.db, user.id).await?;
    Link::reorder(&state.db, profile.id, &payload.link_ids).await?;
    let links = Link::list_for_profile(&state.db, profile.id, false).await?;
    Ok(Json(links))
}
