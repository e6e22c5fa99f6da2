//! crates/triathlon_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! model providers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AthleteRequest, NewWorkoutLog, ProgramSummary, RaceDistance, SavedProgram, Sport,
    TrainingProgram, WorkoutLog, WorkoutStats,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The provider refused a request parameter and no fallback remained.
    #[error("Provider rejected a request parameter: {0}")]
    InvalidParameter(String),
    #[error("Provider call failed: {0}")]
    Provider(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Text Generation Port
//=========================================================================================

/// One call to a text-completion model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_output_tokens: u32,
    /// `None` leaves the model default in place.
    pub temperature: Option<f32>,
    /// Ask the provider to reply with a single JSON object when it supports it.
    pub json_object: bool,
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => f.write_str("stop"),
            FinishReason::Length => f.write_str("length"),
            FinishReason::ContentFilter => f.write_str("content_filter"),
            FinishReason::Other(reason) => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub finish_reason: Option<FinishReason>,
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Short provider label used in logs.
    fn provider_name(&self) -> &str;

    /// Runs a single completion and reports the generated text with its finish reason.
    async fn complete(&self, request: &CompletionRequest) -> PortResult<Completion>;
}

//=========================================================================================
// Persistence Port
//=========================================================================================

/// Filter and page for listing saved programs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramQuery {
    pub goal: Option<RaceDistance>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for ProgramQuery {
    fn default() -> Self {
        Self {
            goal: None,
            skip: 0,
            limit: 100,
        }
    }
}

/// Filter and page for listing the workout history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub program_id: Option<Uuid>,
    pub sport: Option<Sport>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            program_id: None,
            sport: None,
            skip: 0,
            limit: 100,
        }
    }
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Programs ---
    async fn save_program(
        &self,
        request: &AthleteRequest,
        program: &TrainingProgram,
    ) -> PortResult<SavedProgram>;

    async fn get_program(&self, program_id: Uuid) -> PortResult<SavedProgram>;

    /// Newest first.
    async fn list_programs(&self, query: &ProgramQuery) -> PortResult<Vec<ProgramSummary>>;

    async fn delete_program(&self, program_id: Uuid) -> PortResult<()>;

    // --- Workout History ---
    async fn log_workout(&self, entry: NewWorkoutLog) -> PortResult<WorkoutLog>;

    /// Newest first.
    async fn list_workout_history(&self, query: &HistoryQuery) -> PortResult<Vec<WorkoutLog>>;

    async fn workout_stats(&self, sport: Option<Sport>) -> PortResult<WorkoutStats>;
}
