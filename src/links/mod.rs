use axum::{
    routing::{get, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/links", get(handlers::list_links).post(handlers::create_link))
        // The static segment takes precedence over "/links/:id".
        .route("/links/reorder", put(handlers::reorder_links))
        .route(
            "/links/:id",
            put(handlers::update_link).delete(handlers::delete_link),
        )
}
