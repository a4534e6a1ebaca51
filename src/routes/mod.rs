mod admin;
mod auth;
mod games;
mod health;
mod users;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /` — liveness check
/// - `/auth/...` — login
/// - `/users/...` — registration, profiles, a user's RSVPs
/// - `/games/...` — game CRUD and per-game RSVPs
/// - `/admin/...` — admin-only user moderation
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/games", games::router())
        .nest("/admin", admin::router())
}
