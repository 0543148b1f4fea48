use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/public/:username", get(handlers::get_public_profile))
        .route(
            "/public/:username/card/:card_id",
            get(handlers::get_profile_via_card),
        )
        .route(
            "/public/:username/click/:link_id",
            post(handlers::track_link_click),
        )
        .route("/public/:username/contact", post(handlers::submit_contact))
}
