//! crates/triathlon_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application: the athlete
//! request, the training program tree produced by the model, and the records
//! kept by the persistence layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MIN_HOURS_PER_WEEK: u32 = 3;
pub const MAX_HOURS_PER_WEEK: u32 = 30;
pub const MIN_DURATION_WEEKS: u32 = 4;
pub const MAX_DURATION_WEEKS: u32 = 52;
pub const DEFAULT_DURATION_WEEKS: u32 = 12;

//=========================================================================================
// Enumerations
//=========================================================================================

/// The three triathlon disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Swim,
    Bike,
    Run,
}

impl Sport {
    pub const ALL: [Sport; 3] = [Sport::Swim, Sport::Bike, Sport::Run];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Swim => "swim",
            Sport::Bike => "bike",
            Sport::Run => "run",
        }
    }
}

/// The race distances a program can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RaceDistance {
    Sprint,
    Olympic,
    HalfIronman,
    FullIronman,
}

impl RaceDistance {
    pub const ALL: [RaceDistance; 4] = [
        RaceDistance::Sprint,
        RaceDistance::Olympic,
        RaceDistance::HalfIronman,
        RaceDistance::FullIronman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RaceDistance::Sprint => "sprint",
            RaceDistance::Olympic => "olympic",
            RaceDistance::HalfIronman => "half_ironman",
            RaceDistance::FullIronman => "full_ironman",
        }
    }

    /// Human-readable race name with the length of each leg.
    pub fn description(&self) -> &'static str {
        match self {
            RaceDistance::Sprint => "Sprint (750m swim, 20km bike, 5km run)",
            RaceDistance::Olympic => "Olympic (1.5km swim, 40km bike, 10km run)",
            RaceDistance::HalfIronman => "Half Ironman (1.9km swim, 90km bike, 21.1km run)",
            RaceDistance::FullIronman => "Full Ironman (3.8km swim, 180km bike, 42.2km run)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    pub const ALL: [FitnessLevel; 3] = [
        FitnessLevel::Beginner,
        FitnessLevel::Intermediate,
        FitnessLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "beginner",
            FitnessLevel::Intermediate => "intermediate",
            FitnessLevel::Advanced => "advanced",
        }
    }
}

/// Error returned when a stored or submitted label is not a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! label_enum {
    ($ty:ty, $kind:literal) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

label_enum!(Sport, "sport");
label_enum!(RaceDistance, "race distance");
label_enum!(FitnessLevel, "fitness level");

//=========================================================================================
// Athlete Request
//=========================================================================================

/// Raised when a request or log entry is built with an out-of-range value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestValidationError {
    #[error("available_hours_per_week must be between 3 and 30, got {0}")]
    HoursPerWeek(u32),
    #[error("duration_weeks must be between 4 and 52, got {0}")]
    DurationWeeks(u32),
    #[error("current_week must be at least 1, got {0}")]
    CurrentWeek(u32),
    #[error("rating must be between 1 and 5, got {0}")]
    Rating(i64),
}

/// An athlete's profile and the shape of the program they want.
///
/// Fields are private so that every instance has passed the bound checks in
/// [`AthleteRequest::new`]; deserialization goes through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "AthleteRequestPayload")]
pub struct AthleteRequest {
    goal: RaceDistance,
    fitness_level: FitnessLevel,
    available_hours_per_week: u32,
    duration_weeks: u32,
    current_week: u32,
    focus_areas: Vec<String>,
}

/// Unchecked wire form of [`AthleteRequest`].
#[derive(Debug, Deserialize)]
pub struct AthleteRequestPayload {
    pub goal: RaceDistance,
    pub fitness_level: FitnessLevel,
    pub available_hours_per_week: u32,
    #[serde(default = "default_duration_weeks")]
    pub duration_weeks: u32,
    #[serde(default = "default_current_week")]
    pub current_week: u32,
    #[serde(default)]
    pub focus_areas: Option<Vec<String>>,
}

fn default_duration_weeks() -> u32 {
    DEFAULT_DURATION_WEEKS
}

fn default_current_week() -> u32 {
    1
}

impl TryFrom<AthleteRequestPayload> for AthleteRequest {
    type Error = RequestValidationError;

    fn try_from(p: AthleteRequestPayload) -> Result<Self, Self::Error> {
        AthleteRequest::new(
            p.goal,
            p.fitness_level,
            p.available_hours_per_week,
            p.duration_weeks,
            p.current_week,
            p.focus_areas.unwrap_or_default(),
        )
    }
}

impl AthleteRequest {
    pub fn new(
        goal: RaceDistance,
        fitness_level: FitnessLevel,
        available_hours_per_week: u32,
        duration_weeks: u32,
        current_week: u32,
        focus_areas: Vec<String>,
    ) -> Result<Self, RequestValidationError> {
        if !(MIN_HOURS_PER_WEEK..=MAX_HOURS_PER_WEEK).contains(&available_hours_per_week) {
            return Err(RequestValidationError::HoursPerWeek(available_hours_per_week));
        }
        if !(MIN_DURATION_WEEKS..=MAX_DURATION_WEEKS).contains(&duration_weeks) {
            return Err(RequestValidationError::DurationWeeks(duration_weeks));
        }
        if current_week < 1 {
            return Err(RequestValidationError::CurrentWeek(current_week));
        }
        Ok(Self {
            goal,
            fitness_level,
            available_hours_per_week,
            duration_weeks,
            current_week,
            focus_areas,
        })
    }

    pub fn goal(&self) -> RaceDistance {
        self.goal
    }

    pub fn fitness_level(&self) -> FitnessLevel {
        self.fitness_level
    }

    pub fn available_hours_per_week(&self) -> u32 {
        self.available_hours_per_week
    }

    pub fn duration_weeks(&self) -> u32 {
        self.duration_weeks
    }

    pub fn current_week(&self) -> u32 {
        self.current_week
    }

    pub fn focus_areas(&self) -> &[String] {
        &self.focus_areas
    }
}

//=========================================================================================
// Training Program Tree
//=========================================================================================

/// One block of a workout's main set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Interval {
    pub duration_minutes: Option<u32>,
    pub distance_km: Option<f64>,
    /// Conventionally one of the five zone names, e.g. "Zone 2".
    pub intensity: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Workout {
    pub sport: Sport,
    pub title: String,
    pub total_duration_minutes: u32,
    pub total_distance_km: Option<f64>,
    pub warmup: String,
    pub main_set: Vec<Interval>,
    pub cooldown: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeekPlan {
    pub week_number: u32,
    pub focus: String,
    pub workouts: Vec<Workout>,
    pub weekly_volume_hours: f64,
    pub weekly_distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrainingProgram {
    pub goal: RaceDistance,
    pub fitness_level: FitnessLevel,
    pub duration_weeks: u32,
    pub weeks: Vec<WeekPlan>,
    pub notes: String,
}

//=========================================================================================
// Persisted Records
//=========================================================================================

/// A generated program as stored, together with the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SavedProgram {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub goal: RaceDistance,
    pub fitness_level: FitnessLevel,
    pub duration_weeks: u32,
    pub available_hours_per_week: u32,
    pub program: TrainingProgram,
    pub notes: Option<String>,
}

/// List view of a saved program, without the program body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProgramSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub goal: RaceDistance,
    pub fitness_level: FitnessLevel,
    pub duration_weeks: u32,
    pub available_hours_per_week: u32,
    pub notes: Option<String>,
}

/// A completed session the athlete wants to record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkoutLog {
    pub program_id: Option<Uuid>,
    pub sport: Sport,
    pub title: String,
    pub duration_minutes: u32,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
    rating: Option<u8>,
}

impl NewWorkoutLog {
    pub fn new(
        program_id: Option<Uuid>,
        sport: Sport,
        title: String,
        duration_minutes: u32,
        distance_km: Option<f64>,
        notes: Option<String>,
    ) -> Self {
        Self {
            program_id,
            sport,
            title,
            duration_minutes,
            distance_km,
            notes,
            rating: None,
        }
    }

    /// Attaches a 1-5 difficulty/satisfaction rating.
    ///
    /// Takes the raw submitted number so that any out-of-range value is reported
    /// the same way.
    pub fn with_rating(mut self, rating: i64) -> Result<Self, RequestValidationError> {
        if !(1..=5).contains(&rating) {
            return Err(RequestValidationError::Rating(rating));
        }
        self.rating = Some(rating as u8);
        Ok(self)
    }

    pub fn rating(&self) -> Option<u8> {
        self.rating
    }
}

/// A row of the workout history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkoutLog {
    pub id: Uuid,
    pub program_id: Option<Uuid>,
    pub completed_at: DateTime<Utc>,
    pub sport: Sport,
    pub title: String,
    pub duration_minutes: u32,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
}

/// Aggregates over the workout history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkoutStats {
    pub total_workouts: u64,
    pub total_duration_minutes: u64,
    pub total_distance_km: f64,
    pub average_rating: f64,
}
