use axum::{extract::State, Json};
use tracing::instrument;

use crate::{
    analytics::repo::{bucket_daily, AnalyticsEvent, AnalyticsSummary},
    auth::extractors::CurrentUser,
    contacts::repo::Contact,
    error::{ApiError, ApiResult},
    links::repo::Link,
    profiles::repo::Profile,
    state::AppState,
};

#[instrument(skip(state, user))]
pub async fn get_analytics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<AnalyticsSummary>> {
    let profile = Profile::find_by_user_id(&state.db, user.id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    let total_clicks = AnalyticsEvent::total_link_clicks(&state.db, profile.id).await?;
    let total_contacts = Contact::count_for_profile(&state.db, profile.id).await?;
    let rows = AnalyticsEvent::daily_counts(&state.db, profile.id).await?;
    let (daily_views, daily_clicks) = bucket_daily(&rows);
    let links = Link::list_for_profile(&state.db, profile.id, false).await?;

    Ok(Json(AnalyticsSummary {
        total_views: profile.views,
        total_clicks,
        total_contacts,
        daily_views,
        daily_clicks,
        links,
    }))
}
