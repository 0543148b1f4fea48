use axum::extract::{Path, State};
use axum::Json;
use tracing::instrument;

use crate::auth::dto::MessageResponse;
use crate::auth::extractors::CurrentUser;
use crate::email;
use crate::error::{ApiError, ApiResult};
use crate::profiles::repo::Profile;
use crate::state::AppState;

use super::dto::{
    ActivatedCardResponse, CardStatusResponse, GenerateCardsRequest, GeneratedCardsResponse,
    MAX_BATCH_SIZE,
};
use super::repo::{generate_code, PhysicalCard};

/// Only the bound user may unlink. An unactivated card is bound to nobody,
/// so it fails this check too.
fn ensure_card_owner(card: &PhysicalCard, user_id: uuid::Uuid) -> Result<(), ApiError> {
    if card.user_id != Some(user_id) {
        return Err(ApiError::Forbidden("Card is not linked to your account"));
    }
    Ok(())
}

#[instrument(skip(state, user, payload), fields(user_id = %user.0.id))]
pub async fn generate_cards(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<GenerateCardsRequest>,
) -> ApiResult<Json<GeneratedCardsResponse>> {
    if payload.count == 0 || payload.count > MAX_BATCH_SIZE {
        return Err(ApiError::Validation(format!(
            "count must be between 1 and {MAX_BATCH_SIZE}"
        )));
    }

    let mut cards = Vec::with_capacity(payload.count as usize);
    for _ in 0..payload.count {
        // Retry on the rare code collision instead of failing the batch.
        let card = loop {
            match PhysicalCard::create(&state.db, &generate_code(), payload.batch_name.as_deref())
                .await
            {
                Ok(card) => break card,
                Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23505") => continue,
                Err(e) => return Err(e.into()),
            }
        };
        cards.push(card);
    }
    tracing::info!(count = cards.len(), "Generated card batch");
    Ok(Json(GeneratedCardsResponse { cards }))
}

/// Unauthenticated: this is what the QR code resolves through.
#[instrument(skip(state))]
pub async fn card_status(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<CardStatusResponse>> {
    let code = code.trim().to_uppercase();
    let card = PhysicalCard::find_by_code(&state.db, &code)
        .await?
        .ok_or(ApiError::NotFound("Card not found"))?;

    let username = match card.profile_id {
        Some(profile_id) => Profile::find_by_id(&state.db, profile_id)
            .await?
            .map(|p| p.username),
        None => None,
    };
    Ok(Json(CardStatusResponse::new(&card, username)))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn activate_card(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(code): Path<String>,
) -> ApiResult<Json<ActivatedCardResponse>> {
    let code = code.trim().to_uppercase();
    PhysicalCard::find_by_code(&state.db, &code)
        .await?
        .ok_or(ApiError::NotFound("Card not found"))?;

    let profile = Profile::find_by_user_id(&state.db, user.0.id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    let card = match PhysicalCard::activate(&state.db, &code, user.0.id, profile.id).await? {
        Some(card) => card,
        // Lost to a concurrent activation, or was activated all along.
        None => return Err(ApiError::Conflict("Card already activated".to_string())),
    };

    let profile_link = format!("/u/{}", profile.username);
    email::send_card_activation(&state, &user.0, &card.code, &profile.username);
    tracing::info!(code = %card.code, "Card activated");
    Ok(Json(ActivatedCardResponse {
        card,
        redirect_to: profile_link,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn unlink_card(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(code): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let code = code.trim().to_uppercase();
    let card = PhysicalCard::find_by_code(&state.db, &code)
        .await?
        .ok_or(ApiError::NotFound("Card not found"))?;

    ensure_card_owner(&card, user.0.id)?;

    PhysicalCard::unlink(&state.db, &code, user.0.id).await?;
    tracing::info!(code = %code, "Card unlinked");
    Ok(Json(MessageResponse::new("Card unlinked")))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn my_cards(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<PhysicalCard>>> {
    let cards = PhysicalCard::list_for_user(&state.db, user.0.id).await?;
    Ok(Json(cards))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::repo::{STATUS_ACTIVATED, STATUS_UNACTIVATED};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn card(status: &str, user_id: Option<Uuid>) -> PhysicalCard {
        PhysicalCard {
            id: Uuid::new_v4(),
            code: "FC11223344".to_string(),
            status: status.to_string(),
            user_id,
            profile_id: user_id.map(|_| Uuid::new_v4()),
            batch_name: None,
            activated_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn owner_may_unlink() {
        let owner = Uuid::new_v4();
        let card = card(STATUS_ACTIVATED, Some(owner));
        assert!(ensure_card_owner(&card, owner).is_ok());
    }

    #[test]
    fn foreign_card_is_forbidden() {
        let card = card(STATUS_ACTIVATED, Some(Uuid::new_v4()));
        let err = ensure_card_owner(&card, Uuid::new_v4()).unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn unbound_card_is_forbidden_not_a_validation_error() {
        let card = card(STATUS_UNACTIVATED, None);
        let err = ensure_card_owner(&card, Uuid::new_v4()).unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
