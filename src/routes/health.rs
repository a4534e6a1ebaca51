use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Liveness route at the root path.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root))
}

/// `GET /`
async fn root() -> &'static str {
    "Pickup Sports Game API is running!"
}
