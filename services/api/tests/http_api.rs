//! End-to-end checks of the HTTP routes over an in-memory database and a
//! canned text-generation provider.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;
use triathlon_api_lib::{
    adapters::DbAdapter,
    web::{router, AppState},
};
use triathlon_core::{
    ports::{Completion, CompletionRequest, FinishReason, PortError, PortResult, TextGenerationService},
    GenerationProfile, ProgramGenerator,
};

/// Answers every completion with the same reply.
struct CannedProvider {
    reply: Result<String, String>,
}

#[async_trait]
impl TextGenerationService for CannedProvider {
    fn provider_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _request: &CompletionRequest) -> PortResult<Completion> {
        match &self.reply {
            Ok(text) => Ok(Completion {
                text: text.clone(),
                finish_reason: Some(FinishReason::Stop),
            }),
            Err(message) => Err(PortError::Provider(message.clone())),
        }
    }
}

fn week_json(number: u32) -> Value {
    json!({
        "week_number": number,
        "focus": "Base",
        "workouts": [{
            "sport": "swim",
            "title": "Technique",
            "total_duration_minutes": 45,
            "total_distance_km": 1.8,
            "warmup": "300m easy",
            "main_set": [{"distance_km": 1.2, "intensity": "Zone 2", "description": "Drills"}],
            "cooldown": "300m easy",
            "notes": null
        }],
        "weekly_volume_hours": 6.0,
        "weekly_distance_km": 95.0
    })
}

fn program_reply() -> String {
    let program = json!({
        "goal": "sprint",
        "fitness_level": "beginner",
        "duration_weeks": 4,
        "weeks": (1..=4).map(week_json).collect::<Vec<_>>(),
        "notes": "Four weeks to a first sprint"
    });
    format!("Here is your plan:\n```json\n{}\n```", program)
}

async fn app(reply: Result<String, String>) -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    let db = DbAdapter::new(pool);
    db.run_migrations().await.expect("Failed to run migrations");

    let profile = GenerationProfile {
        progressive_above_weeks: None,
        ..GenerationProfile::default()
    };
    let generator = ProgramGenerator::new(Arc::new(CannedProvider { reply }), profile);

    router(Arc::new(AppState {
        db: Arc::new(db),
        generator: Arc::new(generator),
    }))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn athlete() -> Value {
    json!({
        "goal": "sprint",
        "fitness_level": "beginner",
        "available_hours_per_week": 5,
        "duration_weeks": 4
    })
}

#[tokio::test]
async fn generated_program_is_stored_and_retrievable() {
    let app = app(Ok(program_reply())).await;

    let (status, body) = send(&app, "POST", "/api/workouts/generate", Some(athlete())).await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created["message"], "Training program generated successfully");
    assert_eq!(created["program"]["weeks"].as_array().unwrap().len(), 4);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/api/workouts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let stored: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stored["program"], created["program"]);
    assert_eq!(stored["available_hours_per_week"], 5);

    let (status, body) = send(&app, "GET", "/api/workouts?goal=sprint", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert!(listed[0].get("program").is_none());

    let (status, _) = send(&app, "GET", "/api/workouts?goal=olympic", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &format!("/api/workouts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/workouts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_bounds_request_is_unprocessable() {
    let app = app(Ok(program_reply())).await;
    let mut request = athlete();
    request["available_hours_per_week"] = json!(2);

    let (status, _) = send(&app, "POST", "/api/workouts/generate", Some(request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn generation_failure_is_a_server_error() {
    let app = app(Err("upstream unavailable".into())).await;

    let (status, body) = send(&app, "POST", "/api/workouts/generate", Some(athlete())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = String::from_utf8(body).unwrap();
    assert!(message.starts_with("Error generating program:"));
    assert!(message.contains("upstream unavailable"));

    let (_, body) = send(&app, "GET", "/api/workouts", None).await;
    let listed: Value = serde_json::from_slice(&body).unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn single_week_is_generated_on_demand() {
    let app = app(Ok(week_json(2).to_string())).await;
    let payload = json!({"request": athlete(), "week_number": 2, "phase": "build"});

    let (status, body) = send(&app, "POST", "/api/workouts/generate-week", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    let week: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(week["week_number"], 2);

    let payload = json!({"request": athlete(), "week_number": 9, "phase": "build"});
    let (status, _) = send(&app, "POST", "/api/workouts/generate-week", Some(payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_program_is_not_found() {
    let app = app(Ok(program_reply())).await;
    let id = uuid::Uuid::new_v4();

    let (status, _) = send(&app, "GET", &format!("/api/workouts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("/api/workouts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn workout_history_and_stats() {
    let app = app(Ok(program_reply())).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/history/log",
        Some(json!({"sport": "bike", "title": "Long ride", "duration_minutes": 120, "distance_km": 55.5, "rating": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logged: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(logged["message"], "Workout logged successfully");

    let (status, _) = send(&app, "POST", "/api/history/log", Some(json!({"title": "Easy jog", "duration_minutes": 30, "rating": 2}))).await;
    assert_eq!(status, StatusCode::OK);

    for rating in [0, 6, 256, -3] {
        let (status, _) = send(&app, "POST", "/api/history/log", Some(json!({"sport": "swim", "rating": rating}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {rating}");
    }

    let (_, body) = send(&app, "GET", "/api/history?sport=run", None).await;
    let runs: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(runs.as_array().unwrap().len(), 1);
    assert_eq!(runs[0]["title"], "Easy jog");

    let (_, body) = send(&app, "GET", "/api/stats", None).await;
    let stats: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats["total_workouts"], 2);
    assert_eq!(stats["total_duration_minutes"], 150);
    assert_eq!(stats["total_distance_km"], 55.5);
    assert_eq!(stats["average_rating"], 3.0);

    let (_, body) = send(&app, "GET", "/api/stats?sport=bike", None).await;
    let stats: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats["total_workouts"], 1);
}
