mod common;

use axum::http::StatusCode;
use common::{assign, create_activity, four_questions, question, send, submit, TestApp};
use serde_json::{json, Value};

async fn auto_reinforce(app: &TestApp, assignment_id: &str, body: Option<Value>) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/api/v1/teacher/assignments/{}/reinforcement", assignment_id),
        Some(&app.teacher.token),
        body,
    )
    .await
}

async fn assignment_status(app: &TestApp, assignment_id: &str) -> Value {
    let (_, body) = send(
        app,
        "GET",
        &format!("/api/v1/teacher/assignments/{}/summary", assignment_id),
        Some(&app.teacher.token),
        None,
    )
    .await;
    body["assignment"]["status"].clone()
}

#[tokio::test]
async fn test_auto_reinforcement_targets_missed_questions() {
    let app = common::create_test_app().await;
    let (activity_id, assignment_id) = common::submitted_below_threshold(&app).await;

    let (status, body) = auto_reinforce(&app, &assignment_id, None).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["created"], true);
    assert_eq!(body["originalAssignmentId"], assignment_id.as_str());
    assert_eq!(body["studentId"], app.student.id.as_str());

    let reinforcement = &body["reinforcement"];
    assert_eq!(reinforcement["questionCount"], 2);
    assert_eq!(reinforcement["topics"], json!(["História"]));
    assert_eq!(reinforcement["status"], "ASSIGNED");
    assert_eq!(
        reinforcement["description"],
        "Reinforcement: Avaliação bimestral"
    );

    assert_eq!(
        assignment_status(&app, &assignment_id).await,
        "REINFORCEMENT_ASSIGNED"
    );

    // The derived activity only carries the missed questions.
    let derived_id = reinforcement["activityId"].as_str().unwrap();
    let (_, activity) = send(
        &app,
        "GET",
        &format!("/api/v1/teacher/activities/{}", derived_id),
        Some(&app.teacher.token),
        None,
    )
    .await;
    assert_eq!(activity["isReinforcement"], true);
    assert_eq!(activity["originActivityId"], activity_id.as_str());
    assert_eq!(activity["passThreshold"], 70);
    let correct: Vec<&str> = activity["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["correctOption"].as_str().unwrap())
        .collect();
    assert_eq!(correct, vec!["C", "D"]);

    // The student now sees the follow-up, linked to the original.
    let (_, views) = send(
        &app,
        "GET",
        "/api/v1/student/assignments",
        Some(&app.student.token),
        None,
    )
    .await;
    let follow_up = views
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["isReinforcement"] == true)
        .unwrap();
    assert_eq!(follow_up["originalAssignmentId"], assignment_id.as_str());

    let (_, linked) = send(
        &app,
        "GET",
        &format!("/api/v1/teacher/assignments/{}/reinforcements", assignment_id),
        Some(&app.teacher.token),
        None,
    )
    .await;
    assert_eq!(linked.as_array().unwrap().len(), 1);
    assert_eq!(linked[0]["id"], reinforcement["assignmentId"]);
}

#[tokio::test]
async fn test_second_reinforcement_on_same_original() {
    let app = common::create_test_app().await;
    let (_, assignment_id) = common::submitted_below_threshold(&app).await;

    let (status, _) = auto_reinforce(&app, &assignment_id, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = auto_reinforce(&app, &assignment_id, Some(json!({"questionCount": 1}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["reinforcement"]["questionCount"], 1);

    assert_eq!(
        assignment_status(&app, &assignment_id).await,
        "REINFORCEMENT_ASSIGNED"
    );
}

#[tokio::test]
async fn test_not_needed_when_everything_is_correct() {
    let app = common::create_test_app().await;
    let activity_id = create_activity(&app, four_questions()).await;
    let assignment_id = assign(&app, &activity_id, &app.student.id).await;
    let (status, _) = submit(
        &app,
        &assignment_id,
        json!({"0": "A", "1": "B", "2": "C", "3": "D"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = auto_reinforce(&app, &assignment_id, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
    assert!(body.get("reinforcement").is_none());

    // Nothing was written.
    assert_eq!(assignment_status(&app, &assignment_id).await, "SUBMITTED");
    let (_, linked) = send(
        &app,
        "GET",
        &format!("/api/v1/teacher/assignments/{}/reinforcements", assignment_id),
        Some(&app.teacher.token),
        None,
    )
    .await;
    assert!(linked.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_topic_filter() {
    let app = common::create_test_app().await;
    let activity_id = create_activity(&app, four_questions()).await;
    let assignment_id = assign(&app, &activity_id, &app.student.id).await;
    let (status, _) = submit(&app, &assignment_id, json!({"0": "E", "1": "E"})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = auto_reinforce(
        &app,
        &assignment_id,
        Some(json!({"topics": ["Geografia"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(assignment_status(&app, &assignment_id).await, "SUBMITTED");

    let (status, body) = auto_reinforce(
        &app,
        &assignment_id,
        Some(json!({"topics": ["matematica"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["reinforcement"]["questionCount"], 2);
    assert_eq!(body["reinforcement"]["topics"], json!(["Matemática"]));
}

#[tokio::test]
async fn test_auto_requires_a_submission() {
    let app = common::create_test_app().await;
    let activity_id = create_activity(&app, four_questions()).await;
    let assignment_id = assign(&app, &activity_id, &app.student.id).await;

    let (status, _) = auto_reinforce(&app, &assignment_id, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = auto_reinforce(&app, &assignment_id, Some(json!({"questionCount": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reinforcement_ownership() {
    let app = common::create_test_app().await;
    let (_, assignment_id) = common::submitted_below_threshold(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/teacher/assignments/{}/reinforcement", assignment_id),
        Some(&app.other_teacher.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = auto_reinforce(&app, &classroom_api::utils::ids::new_id(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cannot_reinforce_a_reinforcement_in_any_mode() {
    let app = common::create_test_app().await;
    let (_, assignment_id) = common::submitted_below_threshold(&app).await;
    let (_, body) = auto_reinforce(&app, &assignment_id, None).await;
    let reinforcement_id = body["reinforcement"]["assignmentId"]
        .as_str()
        .unwrap()
        .to_string();
    let derived_activity = body["reinforcement"]["activityId"]
        .as_str()
        .unwrap()
        .to_string();

    // Let the student complete the reinforcement badly as well.
    let (status, _) = submit(&app, &reinforcement_id, json!({"0": "E", "1": "E"})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = auto_reinforce(&app, &reinforcement_id, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let base = format!("/api/v1/teacher/assignments/{}/reinforcement", reinforcement_id);
    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/manual/activity", base),
        Some(&app.teacher.token),
        Some(json!({"description": "Extra", "questions": [question("q", "t", "A")]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/manual/assign", base),
        Some(&app.teacher.token),
        Some(json!({"activityId": derived_activity})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/manual", base),
        Some(&app.teacher.token),
        Some(json!({"description": "Extra", "questions": [question("q", "t", "A")]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_manual_author_then_assign() {
    let app = common::create_test_app().await;
    let (activity_id, assignment_id) = common::submitted_below_threshold(&app).await;
    let base = format!("/api/v1/teacher/assignments/{}/reinforcement", assignment_id);

    let long_description = "x".repeat(250);
    let (status, authored) = send(
        &app,
        "POST",
        &format!("{}/manual/activity", base),
        Some(&app.teacher.token),
        Some(json!({
            "description": format!("  {}  ", long_description),
            "questions": [question("Revisão", "História", "B")]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", authored);
    assert_eq!(authored["questionCount"], 1);
    assert_eq!(authored["originActivityId"], activity_id.as_str());
    assert_eq!(authored["description"].as_str().unwrap().chars().count(), 180);

    // Authoring alone does not touch the original.
    assert_eq!(assignment_status(&app, &assignment_id).await, "SUBMITTED");

    let authored_id = authored["activityId"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/manual/assign", base),
        Some(&app.other_teacher.token),
        Some(json!({"activityId": authored_id})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/manual/assign", base),
        Some(&app.teacher.token),
        Some(json!({"activityId": authored_id, "dueAt": "2026-11-30T23:59:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["reinforcement"]["activityId"], authored_id);
    assert_eq!(body["reinforcement"]["dueAt"], "2026-11-30T23:59:00Z");
    assert!(body["reinforcement"].get("topics").is_none());
    assert_eq!(
        assignment_status(&app, &assignment_id).await,
        "REINFORCEMENT_ASSIGNED"
    );
}

#[tokio::test]
async fn test_manual_assign_checks_the_activity() {
    let app = common::create_test_app().await;
    let (_, assignment_id) = common::submitted_below_threshold(&app).await;
    let base = format!("/api/v1/teacher/assignments/{}/reinforcement", assignment_id);

    // Unknown activity.
    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/manual/assign", base),
        Some(&app.teacher.token),
        Some(json!({"activityId": classroom_api::utils::ids::new_id()})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A regular catalog activity is not a reinforcement.
    let plain = create_activity(&app, four_questions()).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/manual/assign", base),
        Some(&app.teacher.token),
        Some(json!({"activityId": plain})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A reinforcement derived from a different activity.
    let (_, other_assignment) = common::submitted_below_threshold(&app).await;
    let (status, foreign) = send(
        &app,
        "POST",
        &format!(
            "/api/v1/teacher/assignments/{}/reinforcement/manual/activity",
            other_assignment
        ),
        Some(&app.teacher.token),
        Some(json!({"description": "Outra", "questions": [question("q", "t", "A")]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/manual/assign", base),
        Some(&app.teacher.token),
        Some(json!({"activityId": foreign["activityId"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("does not correspond"));

    assert_eq!(assignment_status(&app, &assignment_id).await, "SUBMITTED");
}

#[tokio::test]
async fn test_manual_in_one_call() {
    let app = common::create_test_app().await;
    let (_, assignment_id) = common::submitted_below_threshold(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/teacher/assignments/{}/reinforcement/manual", assignment_id),
        Some(&app.teacher.token),
        Some(json!({
            "description": "Revisão de História",
            "questions": [
                question("Q1", "História", "C"),
                question("Q2", "História", "D")
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["reinforcement"]["questionCount"], 2);
    assert_eq!(body["reinforcement"]["description"], "Revisão de História");
    assert_eq!(
        assignment_status(&app, &assignment_id).await,
        "REINFORCEMENT_ASSIGNED"
    );

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/teacher/assignments/{}/reinforcement/manual", assignment_id),
        Some(&app.teacher.token),
        Some(json!({"description": "   ", "questions": [question("Q", "t", "A")]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
