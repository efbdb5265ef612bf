#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use classroom_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    models::user::{UserRecord, UserRole},
    repositories::memory::InMemoryDirectory,
    services::AppState,
    utils::ids::new_id,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &str = "test-secret";

pub struct TestUser {
    pub id: String,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub teacher: TestUser,
    pub other_teacher: TestUser,
    pub student: TestUser,
    pub other_student: TestUser,
}

pub async fn create_test_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let directory = Arc::new(InMemoryDirectory::new());
    let teacher = seed_user(&directory, "Ana Souza", UserRole::Teacher).await;
    let other_teacher = seed_user(&directory, "Bruno Lima", UserRole::Teacher).await;
    let student = seed_user(&directory, "Carla Dias", UserRole::Student).await;
    let other_student = seed_user(&directory, "Davi Rocha", UserRole::Student).await;

    let app_state = Arc::new(AppState::in_memory(
        Config::for_memory(TEST_SECRET),
        directory,
    ));

    TestApp {
        router: create_router(app_state),
        teacher,
        other_teacher,
        student,
        other_student,
    }
}

async fn seed_user(directory: &InMemoryDirectory, name: &str, role: UserRole) -> TestUser {
    let id = new_id();
    directory
        .insert(UserRecord {
            id: id.clone(),
            name: name.to_string(),
            email: format!("{}@school.test", name.to_lowercase().replace(' ', ".")),
            role,
        })
        .await;
    TestUser {
        token: token_for(&id, role),
        id,
    }
}

pub fn token_for(user_id: &str, role: UserRole) -> String {
    JwtService::new(TEST_SECRET)
        .generate_token(JwtClaims::new(user_id, role, 3600))
        .unwrap()
}

/// Sends a request and returns the status with the parsed JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

pub fn question(statement: &str, topic: &str, correct: &str) -> Value {
    json!({
        "statement": statement,
        "topic": topic,
        "options": {"A": "alpha", "B": "beta", "C": "gamma", "D": "delta", "E": "epsilon"},
        "correctOption": correct
    })
}

/// Four questions: two on "Matemática" (A, B), two on "História" (C, D).
pub fn four_questions() -> Vec<Value> {
    vec![
        question("Quanto é 2 + 2?", "Matemática", "A"),
        question("Quanto é 3 x 3?", "Matemática", "B"),
        question("Quando foi a independência?", "História", "C"),
        question("Quem descobriu o Brasil?", "História", "D"),
    ]
}

pub async fn create_activity(app: &TestApp, questions: Vec<Value>) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/teacher/activities",
        Some(&app.teacher.token),
        Some(json!({
            "description": "Avaliação bimestral",
            "questions": questions
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create activity: {}", body);
    body["id"].as_str().unwrap().to_string()
}

pub async fn assign(app: &TestApp, activity_id: &str, student_id: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/teacher/assignments",
        Some(&app.teacher.token),
        Some(json!({ "activityId": activity_id, "studentId": student_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create assignment: {}", body);
    body["id"].as_str().unwrap().to_string()
}

pub async fn submit(app: &TestApp, assignment_id: &str, answers: Value) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/api/v1/student/assignments/{}/submit", assignment_id),
        Some(&app.student.token),
        Some(json!({ "answers": answers })),
    )
    .await
}

/// Creates the four-question activity, assigns it and submits two correct
/// answers (50%, below the default threshold). Returns (activity, assignment).
pub async fn submitted_below_threshold(app: &TestApp) -> (String, String) {
    let activity_id = create_activity(app, four_questions()).await;
    let assignment_id = assign(app, &activity_id, &app.student.id).await;
    let (status, body) = submit(
        app,
        &assignment_id,
        json!({"0": "A", "1": "B", "2": "A", "3": "A"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "submit: {}", body);
    (activity_id, assignment_id)
}
