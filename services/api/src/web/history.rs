//! services/api/src/web/history.rs
//!
//! Handlers for the workout log and its aggregates.

use crate::web::{rest::port_error_response, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use triathlon_core::{
    ports::HistoryQuery, NewWorkoutLog, Sport, WorkoutLog, WorkoutStats,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// A completed workout as submitted by the athlete.
#[derive(Deserialize, ToSchema)]
pub struct LogWorkoutRequest {
    pub program_id: Option<Uuid>,
    #[serde(default = "default_sport")]
    pub sport: Sport,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
    /// 1 to 5.
    pub rating: Option<i64>,
}

fn default_sport() -> Sport {
    Sport::Run
}

fn default_title() -> String {
    "Workout".to_string()
}

fn default_duration() -> u32 {
    60
}

#[derive(Serialize, ToSchema)]
pub struct LogWorkoutResponse {
    pub id: Uuid,
    pub message: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    pub program_id: Option<Uuid>,
    pub sport: Option<Sport>,
    #[serde(default)]
    pub skip: u32,
    pub limit: Option<u32>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsParams {
    pub sport: Option<Sport>,
}

/// Record a completed workout.
#[utoipa::path(
    post,
    path = "/api/history/log",
    request_body = LogWorkoutRequest,
    responses(
        (status = 200, description = "Workout logged", body = LogWorkoutResponse),
        (status = 400, description = "Rating outside 1-5")
    )
)]
pub async fn log_workout_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LogWorkoutRequest>,
) -> Result<Json<LogWorkoutResponse>, (StatusCode, String)> {
    let mut entry = NewWorkoutLog::new(
        payload.program_id,
        payload.sport,
        payload.title,
        payload.duration_minutes,
        payload.distance_km,
        payload.notes,
    );
    if let Some(rating) = payload.rating {
        entry = entry
            .with_rating(rating)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    }

    let logged = app_state
        .db
        .log_workout(entry)
        .await
        .map_err(|e| port_error_response("Failed to log workout", e))?;
    info!(workout_id = %logged.id, sport = %logged.sport, "workout logged");

    Ok(Json(LogWorkoutResponse {
        id: logged.id,
        message: "Workout logged successfully".to_string(),
    }))
}

/// List logged workouts, newest first.
#[utoipa::path(
    get,
    path = "/api/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "Logged workouts", body = [WorkoutLog])
    )
)]
pub async fn list_history_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<WorkoutLog>>, (StatusCode, String)> {
    let defaults = HistoryQuery::default();
    let query = HistoryQuery {
        program_id: params.program_id,
        sport: params.sport,
        skip: params.skip,
        limit: params.limit.unwrap_or(defaults.limit),
    };
    app_state
        .db
        .list_workout_history(&query)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to load history", e))
}

/// Totals over the workout log, optionally for one sport.
#[utoipa::path(
    get,
    path = "/api/stats",
    params(StatsParams),
    responses(
        (status = 200, description = "Aggregated statistics", body = WorkoutStats)
    )
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<WorkoutStats>, (StatusCode, String)> {
    app_state
        .db
        .workout_stats(params.sport)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to compute stats", e))
}
