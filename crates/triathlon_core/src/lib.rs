pub mod domain;
pub mod extract;
pub mod generator;
pub mod negotiation;
pub mod ports;
pub mod prompts;
pub mod schema;

pub use domain::{
    AthleteRequest, FitnessLevel, Interval, NewWorkoutLog, ProgramSummary, RaceDistance,
    RequestValidationError, SavedProgram, Sport, TrainingProgram, WeekPlan, Workout, WorkoutLog,
    WorkoutStats,
};
pub use generator::{GenerationError, GenerationProfile, Phase, PhasePlan, ProgramGenerator};
pub use ports::{
    Completion, CompletionRequest, DatabaseService, FinishReason, HistoryQuery, PortError,
    PortResult, ProgramQuery, TextGenerationService,
};
pub use schema::{SchemaError, Strictness};
