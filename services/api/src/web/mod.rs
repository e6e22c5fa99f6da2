pub mod history;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the `/api` routes over the shared state.
///
/// CORS, tracing and Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/workouts/generate", post(rest::generate_program_handler))
        .route("/api/workouts/generate-week", post(rest::generate_week_handler))
        .route("/api/workouts", get(rest::list_programs_handler))
        .route(
            "/api/workouts/{id}",
            get(rest::get_program_handler).delete(rest::delete_program_handler),
        )
        .route("/api/history/log", post(history::log_workout_handler))
        .route("/api/history", get(history::list_history_handler))
        .route("/api/stats", get(history::stats_handler))
        .with_state(app_state)
}
