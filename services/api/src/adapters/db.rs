//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use triathlon_core::domain::{
    AthleteRequest, NewWorkoutLog, ProgramSummary, SavedProgram, Sport, TrainingProgram,
    WorkoutLog, WorkoutStats,
};
use triathlon_core::ports::{DatabaseService, HistoryQuery, PortError, PortResult, ProgramQuery};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProgramRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    goal: String,
    fitness_level: String,
    duration_weeks: i64,
    available_hours_per_week: i64,
    program_json: String,
    notes: Option<String>,
}
impl ProgramRecord {
    fn to_domain(self) -> PortResult<SavedProgram> {
        let program: TrainingProgram =
            serde_json::from_str(&self.program_json).map_err(unexpected)?;
        Ok(SavedProgram {
            id: self.id,
            created_at: self.created_at,
            goal: self.goal.parse().map_err(unexpected)?,
            fitness_level: self.fitness_level.parse().map_err(unexpected)?,
            duration_weeks: self.duration_weeks as u32,
            available_hours_per_week: self.available_hours_per_week as u32,
            program,
            notes: self.notes,
        })
    }
}

#[derive(FromRow)]
struct ProgramSummaryRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    goal: String,
    fitness_level: String,
    duration_weeks: i64,
    available_hours_per_week: i64,
    notes: Option<String>,
}
impl ProgramSummaryRecord {
    fn to_domain(self) -> PortResult<ProgramSummary> {
        Ok(ProgramSummary {
            id: self.id,
            created_at: self.created_at,
            goal: self.goal.parse().map_err(unexpected)?,
            fitness_level: self.fitness_level.parse().map_err(unexpected)?,
            duration_weeks: self.duration_weeks as u32,
            available_hours_per_week: self.available_hours_per_week as u32,
            notes: self.notes,
        })
    }
}

#[derive(FromRow)]
struct WorkoutLogRecord {
    id: Uuid,
    program_id: Option<Uuid>,
    completed_at: DateTime<Utc>,
    sport: String,
    title: String,
    duration_minutes: i64,
    distance_km: Option<f64>,
    notes: Option<String>,
    rating: Option<i64>,
}
impl WorkoutLogRecord {
    fn to_domain(self) -> PortResult<WorkoutLog> {
        Ok(WorkoutLog {
            id: self.id,
            program_id: self.program_id,
            completed_at: self.completed_at,
            sport: self.sport.parse().map_err(unexpected)?,
            title: self.title,
            duration_minutes: self.duration_minutes as u32,
            distance_km: self.distance_km,
            notes: self.notes,
            rating: self.rating.map(|r| r as u8),
        })
    }
}

#[derive(FromRow)]
struct StatsRecord {
    total_workouts: i64,
    total_duration_minutes: i64,
    total_distance_km: f64,
    average_rating: Option<f64>,
}
impl StatsRecord {
    fn to_domain(self) -> WorkoutStats {
        WorkoutStats {
            total_workouts: self.total_workouts as u64,
            total_duration_minutes: self.total_duration_minutes as u64,
            total_distance_km: round2(self.total_distance_km),
            average_rating: round2(self.average_rating.unwrap_or(0.0)),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn save_program(
        &self,
        request: &AthleteRequest,
        program: &TrainingProgram,
    ) -> PortResult<SavedProgram> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let program_json = serde_json::to_string(program).map_err(unexpected)?;

        sqlx::query(
            r#"
            INSERT INTO training_programs (
                id, created_at, goal, fitness_level, duration_weeks,
                available_hours_per_week, program_json, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(id)
        .bind(created_at)
        .bind(request.goal().as_str())
        .bind(request.fitness_level().as_str())
        .bind(request.duration_weeks() as i64)
        .bind(request.available_hours_per_week() as i64)
        .bind(&program_json)
        .bind(&program.notes)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(SavedProgram {
            id,
            created_at,
            goal: request.goal(),
            fitness_level: request.fitness_level(),
            duration_weeks: request.duration_weeks(),
            available_hours_per_week: request.available_hours_per_week(),
            program: program.clone(),
            notes: Some(program.notes.clone()),
        })
    }

    async fn get_program(&self, program_id: Uuid) -> PortResult<SavedProgram> {
        let record = sqlx::query_as::<_, ProgramRecord>(
            r#"
            SELECT id, created_at, goal, fitness_level, duration_weeks,
                   available_hours_per_week, program_json, notes
            FROM training_programs WHERE id = ?1
            "#,
        )
        .bind(program_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Program {} not found", program_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn list_programs(&self, query: &ProgramQuery) -> PortResult<Vec<ProgramSummary>> {
        let records = sqlx::query_as::<_, ProgramSummaryRecord>(
            r#"
            SELECT id, created_at, goal, fitness_level, duration_weeks,
                   available_hours_per_week, notes
            FROM training_programs
            WHERE (?1 IS NULL OR goal = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(query.goal.map(|g| g.as_str()))
        .bind(query.limit as i64)
        .bind(query.skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn delete_program(&self, program_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM training_programs WHERE id = ?1")
            .bind(program_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Program {} not found", program_id)));
        }
        Ok(())
    }

    async fn log_workout(&self, entry: NewWorkoutLog) -> PortResult<WorkoutLog> {
        let id = Uuid::new_v4();
        let completed_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO workout_history (
                id, program_id, completed_at, sport, title,
                duration_minutes, distance_km, notes, rating
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(id)
        .bind(entry.program_id)
        .bind(completed_at)
        .bind(entry.sport.as_str())
        .bind(&entry.title)
        .bind(entry.duration_minutes as i64)
        .bind(entry.distance_km)
        .bind(&entry.notes)
        .bind(entry.rating().map(i64::from))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(WorkoutLog {
            id,
            program_id: entry.program_id,
            completed_at,
            sport: entry.sport,
            rating: entry.rating(),
            title: entry.title,
            duration_minutes: entry.duration_minutes,
            distance_km: entry.distance_km,
            notes: entry.notes,
        })
    }

    async fn list_workout_history(&self, query: &HistoryQuery) -> PortResult<Vec<WorkoutLog>> {
        let records = sqlx::query_as::<_, WorkoutLogRecord>(
            r#"
            SELECT id, program_id, completed_at, sport, title,
                   duration_minutes, distance_km, notes, rating
            FROM workout_history
            WHERE (?1 IS NULL OR program_id = ?1)
              AND (?2 IS NULL OR sport = ?2)
            ORDER BY completed_at DESC, rowid DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(query.program_id)
        .bind(query.sport.map(|s| s.as_str()))
        .bind(query.limit as i64)
        .bind(query.skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn workout_stats(&self, sport: Option<Sport>) -> PortResult<WorkoutStats> {
        let record = sqlx::query_as::<_, StatsRecord>(
            r#"
            SELECT COUNT(*) AS total_workouts,
                   COALESCE(SUM(duration_minutes), 0) AS total_duration_minutes,
                   COALESCE(SUM(distance_km), 0.0) AS total_distance_km,
                   AVG(rating) AS average_rating
            FROM workout_history
            WHERE (?1 IS NULL OR sport = ?1)
            "#,
        )
        .bind(sport.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use triathlon_core::domain::{FitnessLevel, RaceDistance, WeekPlan};

    /// In-memory database with migrations applied.
    ///
    /// A single connection keeps every query on the same in-memory database.
    async fn setup_test_db() -> DbAdapter {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        let adapter = DbAdapter::new(pool);
        adapter.run_migrations().await.expect("Failed to run migrations");
        adapter
    }

    fn request(goal: RaceDistance) -> AthleteRequest {
        AthleteRequest::new(goal, FitnessLevel::Beginner, 6, 8, 1, vec![]).unwrap()
    }

    fn program(goal: RaceDistance) -> TrainingProgram {
        TrainingProgram {
            goal,
            fitness_level: FitnessLevel::Beginner,
            duration_weeks: 8,
            weeks: vec![WeekPlan {
                week_number: 1,
                focus: "Base".into(),
                workouts: vec![],
                weekly_volume_hours: 5.0,
                weekly_distance_km: 60.5,
            }],
            notes: format!("{goal} plan"),
        }
    }

    #[tokio::test]
    async fn saved_program_round_trips() {
        let db = setup_test_db().await;
        let saved = db
            .save_program(&request(RaceDistance::Sprint), &program(RaceDistance::Sprint))
            .await
            .unwrap();

        let loaded = db.get_program(saved.id).await.unwrap();
        assert_eq!(loaded.program, program(RaceDistance::Sprint));
        assert_eq!(loaded.goal, RaceDistance::Sprint);
        assert_eq!(loaded.available_hours_per_week, 6);
        assert_eq!(loaded.notes.as_deref(), Some("sprint plan"));
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let db = setup_test_db().await;
        assert!(matches!(
            db.get_program(Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            db.delete_program(Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_goal_and_pages_newest_first() {
        let db = setup_test_db().await;
        let mut ids = Vec::new();
        for goal in [RaceDistance::Sprint, RaceDistance::Olympic, RaceDistance::Sprint] {
            ids.push(db.save_program(&request(goal), &program(goal)).await.unwrap().id);
        }

        let all = db.list_programs(&ProgramQuery::default()).await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![ids[2], ids[1], ids[0]]);

        let sprints = db
            .list_programs(&ProgramQuery { goal: Some(RaceDistance::Sprint), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(sprints.len(), 2);
        assert!(sprints.iter().all(|p| p.goal == RaceDistance::Sprint));

        let page = db
            .list_programs(&ProgramQuery { goal: None, skip: 1, limit: 1 })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, ids[1]);
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let db = setup_test_db().await;
        let saved = db
            .save_program(&request(RaceDistance::FullIronman), &program(RaceDistance::FullIronman))
            .await
            .unwrap();

        db.delete_program(saved.id).await.unwrap();
        assert!(matches!(db.get_program(saved.id).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn history_is_filtered_by_program_and_sport() {
        let db = setup_test_db().await;
        let program_id = Uuid::new_v4();

        db.log_workout(
            NewWorkoutLog::new(Some(program_id), Sport::Run, "Tempo run".into(), 45, Some(9.0), None)
                .with_rating(4)
                .unwrap(),
        )
        .await
        .unwrap();
        db.log_workout(NewWorkoutLog::new(Some(program_id), Sport::Swim, "Drills".into(), 30, None, None))
            .await
            .unwrap();
        let logged = db
            .log_workout(NewWorkoutLog::new(None, Sport::Run, "Recovery jog".into(), 25, Some(4.0), Some("legs heavy".into())))
            .await
            .unwrap();

        let runs = db
            .list_workout_history(&HistoryQuery { sport: Some(Sport::Run), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, logged.id);
        assert_eq!(runs[1].rating, Some(4));

        let for_program = db
            .list_workout_history(&HistoryQuery { program_id: Some(program_id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(for_program.len(), 2);
        assert!(for_program.iter().all(|w| w.program_id == Some(program_id)));
    }

    #[tokio::test]
    async fn stats_aggregate_history() {
        let db = setup_test_db().await;

        let empty = db.workout_stats(None).await.unwrap();
        assert_eq!(
            empty,
            WorkoutStats {
                total_workouts: 0,
                total_duration_minutes: 0,
                total_distance_km: 0.0,
                average_rating: 0.0
            }
        );

        for (sport, minutes, km, rating) in [
            (Sport::Bike, 90, Some(40.123), Some(3)),
            (Sport::Bike, 60, Some(25.0), Some(4)),
            (Sport::Run, 40, None, Some(4)),
            (Sport::Swim, 30, Some(1.5), None),
        ] {
            let mut entry = NewWorkoutLog::new(None, sport, "Session".into(), minutes, km, None);
            if let Some(r) = rating {
                entry = entry.with_rating(r).unwrap();
            }
            db.log_workout(entry).await.unwrap();
        }

        let all = db.workout_stats(None).await.unwrap();
        assert_eq!(all.total_workouts, 4);
        assert_eq!(all.total_duration_minutes, 220);
        assert_eq!(all.total_distance_km, 66.62);
        assert_eq!(all.average_rating, 3.67);

        let bike = db.workout_stats(Some(Sport::Bike)).await.unwrap();
        assert_eq!(bike.total_workouts, 2);
        assert_eq!(bike.total_distance_km, 65.12);
        assert_eq!(bike.average_rating, 3.5);
    }
}
