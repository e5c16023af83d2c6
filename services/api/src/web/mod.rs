pub mod cook;
pub mod protocol;
pub mod rest;
pub mod sse;
pub mod state;
pub mod ws_handler;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
pub use state::AppState;
pub use ws_handler::ws_handler;

/// Builds the API routes. CORS and Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(rest::health_handler))
        .route("/dinner/suggest", post(rest::suggest_dinner_handler))
        .route("/cook/start", post(cook::start_session_handler))
        .route("/cook/action", post(cook::session_action_handler))
        .route("/cook/stop", post(cook::stop_session_handler))
        .route("/cook/{session_id}", get(cook::session_status_handler))
        .route("/cook/{session_id}/events", get(sse::session_events_handler))
        .route("/cook/{session_id}/ws", get(ws_handler))
        .with_state(app_state)
}
