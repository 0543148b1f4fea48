use axum::routing::post;
use axum::Router;

use crate::state::AppState;

mod handlers;
pub mod storage;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/upload/avatar",
            post(handlers::upload_avatar).delete(handlers::delete_avatar),
        )
        .route(
            "/upload/cover",
            post(handlers::upload_cover).delete(handlers::delete_cover),
        )
}
