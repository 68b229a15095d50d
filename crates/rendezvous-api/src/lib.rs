pub mod comments;
pub mod error;
pub mod health;
pub mod profiles;
pub mod state;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

/// All routes, with state applied. Middleware layers are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/profiles/{profile_id}",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        .route(
            "/profiles/{profile_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/comments/{comment_id}", delete(comments::delete_comment))
        .with_state(state)
}
