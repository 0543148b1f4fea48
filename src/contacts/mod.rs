use axum::{
    routing::{delete, get},
    Router,
};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(handlers::list_contacts))
        .route("/contacts/:id", delete(handlers::delete_contact))
}
