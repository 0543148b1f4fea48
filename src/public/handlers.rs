use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::analytics::repo::{AnalyticsEvent, CLICK, CONTACT_SAVE, VIEW};
use crate::auth::dto::MessageResponse;
use crate::cards::repo::{PhysicalCard, STATUS_ACTIVATED};
use crate::contacts::repo::Contact;
use crate::error::{ApiError, ApiResult};
use crate::links::repo::Link;
use crate::profiles::repo::Profile;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub profile: Profile,
    pub links: Vec<Link>,
}

fn default_source() -> String {
    "form".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ContactCreate {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn find_public_profile(state: &AppState, username: &str) -> ApiResult<Profile> {
    let username = username.trim().to_lowercase();
    Profile::find_by_username(&state.db, &username)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))
}

/// A card only vouches for the profile it is activated against.
fn ensure_card_linked(card: &PhysicalCard, profile_id: Uuid) -> Result<(), ApiError> {
    if card.status != STATUS_ACTIVATED || card.profile_id != Some(profile_id) {
        return Err(ApiError::Forbidden("Card not linked to this profile"));
    }
    Ok(())
}

async fn record_view(
    state: &AppState,
    profile_id: Uuid,
    headers: &HeaderMap,
    card_id: Option<Uuid>,
) -> ApiResult<()> {
    Profile::increment_views(&state.db, profile_id).await?;
    let metadata = json!({
        "user_agent": header_str(headers, "user-agent"),
        "referer": header_str(headers, "referer"),
        "card_id": card_id,
    });
    AnalyticsEvent::record(&state.db, profile_id, VIEW, Some(metadata)).await?;
    Ok(())
}

/// The public card page. Every fetch counts as a view.
#[instrument(skip(state, headers))]
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<PublicProfileResponse>> {
    let profile = find_public_profile(&state, &username).await?;
    let links = Link::list_for_profile(&state.db, profile.id, true).await?;

    record_view(&state, profile.id, &headers, None).await?;

    Ok(Json(PublicProfileResponse { profile, links }))
}

/// Same page, reached by scanning a physical card. The card must be
/// activated and bound to this exact profile.
#[instrument(skip(state, headers))]
pub async fn get_profile_via_card(
    State(state): State<AppState>,
    Path((username, card_id)): Path<(String, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<Json<PublicProfileResponse>> {
    let profile = find_public_profile(&state, &username).await?;
    let card = PhysicalCard::find_by_id(&state.db, card_id)
        .await?
        .ok_or(ApiError::NotFound("Card not found"))?;
    ensure_card_linked(&card, profile.id)?;

    let links = Link::list_for_profile(&state.db, profile.id, true).await?;
    record_view(&state, profile.id, &headers, Some(card.id)).await?;

    Ok(Json(PublicProfileResponse { profile, links }))
}

#[instrument(skip(state))]
pub async fn track_link_click(
    State(state): State<AppState>,
    Path((username, link_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let profile = find_public_profile(&state, &username).await?;

    if !Link::increment_clicks(&state.db, profile.id, link_id).await? {
        return Err(ApiError::NotFound("Link not found"));
    }
    AnalyticsEvent::record(
        &state.db,
        profile.id,
        CLICK,
        Some(json!({ "link_id": link_id })),
    )
    .await?;

    Ok(Json(MessageResponse::new("Click recorded")))
}

#[instrument(skip(state, payload))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<ContactCreate>,
) -> ApiResult<Json<Contact>> {
    let profile = find_public_profile(&state, &username).await?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }

    let contact = Contact::create(
        &state.db,
        profile.id,
        name,
        payload.email.as_deref(),
        payload.phone.as_deref(),
        payload.message.as_deref(),
        &payload.source,
    )
    .await?;
    AnalyticsEvent::record(
        &state.db,
        profile.id,
        CONTACT_SAVE,
        Some(json!({ "contact_id": contact.id })),
    )
    .await?;

    tracing::info!(profile_id = %profile.id, "Contact captured");
    Ok(Json(contact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::repo::STATUS_UNACTIVATED;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use time::OffsetDateTime;

    fn card(status: &str, profile_id: Option<Uuid>) -> PhysicalCard {
        PhysicalCard {
            id: Uuid::new_v4(),
            code: "FCAA00BB11".to_string(),
            status: status.to_string(),
            user_id: profile_id.map(|_| Uuid::new_v4()),
            profile_id,
            batch_name: None,
            activated_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn bound_card_vouches_for_its_profile() {
        let profile_id = Uuid::new_v4();
        let card = card(STATUS_ACTIVATED, Some(profile_id));
        assert!(ensure_card_linked(&card, profile_id).is_ok());
    }

    #[test]
    fn unactivated_card_is_forbidden() {
        let profile_id = Uuid::new_v4();
        let card = card(STATUS_UNACTIVATED, None);
        let err = ensure_card_linked(&card, profile_id).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn card_bound_elsewhere_is_forbidden() {
        let card = card(STATUS_ACTIVATED, Some(Uuid::new_v4()));
        let err = ensure_card_linked(&card, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}
