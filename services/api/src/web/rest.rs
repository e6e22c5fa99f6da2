//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the program endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{history, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use triathlon_core::{
    ports::{PortError, ProgramQuery},
    AthleteRequest, Phase, ProgramSummary, RaceDistance, SavedProgram, TrainingProgram, WeekPlan,
};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_program_handler,
        generate_week_handler,
        list_programs_handler,
        get_program_handler,
        delete_program_handler,
        history::log_workout_handler,
        history::list_history_handler,
        history::stats_handler,
    ),
    components(
        schemas(GenerateProgramResponse, GenerateWeekRequest, MessageResponse)
    ),
    tags(
        (name = "Triathlon Program Generator API", description = "Generate, store and track triathlon training programs.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after a program was generated and stored.
#[derive(Serialize, ToSchema)]
pub struct GenerateProgramResponse {
    pub id: Uuid,
    pub program: TrainingProgram,
    pub message: String,
}

/// Asks for a single week of a program within one phase.
#[derive(Deserialize, ToSchema)]
pub struct GenerateWeekRequest {
    pub request: AthleteRequest,
    pub week_number: u32,
    pub phase: Phase,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProgramsParams {
    #[serde(default)]
    pub skip: u32,
    pub limit: Option<u32>,
    pub goal: Option<RaceDistance>,
}

/// Maps a persistence failure onto the response the client sees.
pub(crate) fn port_error_response(context: &str, err: PortError) -> (StatusCode, String) {
    match err {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Program not found".to_string()),
        other => {
            error!("{}: {:?}", context, other);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{}: {}", context, other))
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a training program and store it.
#[utoipa::path(
    post,
    path = "/api/workouts/generate",
    request_body = AthleteRequest,
    responses(
        (status = 200, description = "Program generated and stored", body = GenerateProgramResponse),
        (status = 422, description = "Request fields out of bounds"),
        (status = 500, description = "Generation or storage failed")
    )
)]
pub async fn generate_program_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<AthleteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let program = app_state.generator.generate(&request).await.map_err(|e| {
        error!("Program generation failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error generating program: {}", e),
        )
    })?;

    let saved = app_state
        .db
        .save_program(&request, &program)
        .await
        .map_err(|e| {
            error!("Failed to store program: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error generating program: {}", e),
            )
        })?;
    info!(program_id = %saved.id, weeks = program.weeks.len(), "program stored");

    Ok(Json(GenerateProgramResponse {
        id: saved.id,
        program,
        message: "Training program generated successfully".to_string(),
    }))
}

/// Generate one week of a program without storing it.
#[utoipa::path(
    post,
    path = "/api/workouts/generate-week",
    request_body = GenerateWeekRequest,
    responses(
        (status = 200, description = "Week generated", body = WeekPlan),
        (status = 422, description = "Request fields out of bounds"),
        (status = 500, description = "Generation failed")
    )
)]
pub async fn generate_week_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GenerateWeekRequest>,
) -> Result<Json<WeekPlan>, (StatusCode, String)> {
    let duration = payload.request.duration_weeks();
    if payload.week_number == 0 || payload.week_number > duration {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("week_number must be between 1 and {}", duration),
        ));
    }

    app_state
        .generator
        .generate_week(&payload.request, payload.week_number, payload.phase)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Week generation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error generating week: {}", e),
            )
        })
}

/// List stored programs, newest first.
#[utoipa::path(
    get,
    path = "/api/workouts",
    params(ListProgramsParams),
    responses(
        (status = 200, description = "Stored programs", body = [ProgramSummary])
    )
)]
pub async fn list_programs_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListProgramsParams>,
) -> Result<Json<Vec<ProgramSummary>>, (StatusCode, String)> {
    let defaults = ProgramQuery::default();
    let query = ProgramQuery {
        goal: params.goal,
        skip: params.skip,
        limit: params.limit.unwrap_or(defaults.limit),
    };
    app_state
        .db
        .list_programs(&query)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to list programs", e))
}

/// Fetch one stored program with its full body.
#[utoipa::path(
    get,
    path = "/api/workouts/{id}",
    params(("id" = Uuid, Path, description = "Program id")),
    responses(
        (status = 200, description = "The stored program", body = SavedProgram),
        (status = 404, description = "Program not found")
    )
)]
pub async fn get_program_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedProgram>, (StatusCode, String)> {
    app_state
        .db
        .get_program(id)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to load program", e))
}

/// Delete a stored program.
#[utoipa::path(
    delete,
    path = "/api/workouts/{id}",
    params(("id" = Uuid, Path, description = "Program id")),
    responses(
        (status = 200, description = "Program deleted", body = MessageResponse),
        (status = 404, description = "Program not found")
    )
)]
pub async fn delete_program_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    app_state
        .db
        .delete_program(id)
        .await
        .map_err(|e| port_error_response("Failed to delete program", e))?;
    info!(program_id = %id, "program deleted");

    Ok(Json(MessageResponse {
        message: "Program deleted successfully".to_string(),
    }))
}
