use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub mod dto;
mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cards/generate", post(handlers::generate_cards))
        .route("/cards/user/my-cards", get(handlers::my_cards))
        .route("/cards/:code", get(handlers::card_status))
        .route("/cards/:code/activate", post(handlers::activate_card))
        .route("/cards/:code/unlink", delete(handlers::unlink_card))
}
