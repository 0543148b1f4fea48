use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, extractors::CurrentUser},
    contacts::repo::Contact,
    error::{ApiError, ApiResult},
    profiles::repo::Profile,
    state::AppState,
};

#[instrument(skip(state, user))]
pub async fn list_contacts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Contact>>> {
    let profile = Profile::find_by_user_id(&state.db, user.id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;
    let contacts = Contact::list_for_profile(&state.db, profile.id).await?;
    Ok(Json(contacts))
}

#[instrument(skip(state, user))]
pub async fn delete_contact(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(contact_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let profile = Profile::find_by_user_id(&state.db, user.id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;
    if !Contact::delete(&state.db, profile.id, contact_id).await? {
        return Err(ApiError::NotFound("Contact not found"));
    }
    info!(%contact_id, "contact deleted");
    Ok(Json(MessageResponse::new("Contact deleted")))
}
