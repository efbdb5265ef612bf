use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppError,
    extractors::AppJson,
    models::{
        activity::CreateActivityRequest,
        assignment::{CreateAssignmentRequest, ListAssignmentsQuery},
        reinforcement::{
            AssignReinforcementActivityRequest, AutoReinforcementRequest,
            CreateReinforcementActivityRequest, ManualReinforcementRequest,
            ReinforcementOutcome, ReinforcementResponse,
        },
        submission::ListSubmissionsQuery,
        user::Actor,
    },
    services::{
        activity_service::ActivityService, assignment_service::AssignmentService,
        reinforcement_service::ReinforcementService, reporting_service::ReportingService,
        submission_service::SubmissionService, AppState,
    },
    utils::ids::parse_id,
};

/// POST /api/v1/teacher/assignments
pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    AppJson(req): AppJson<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = AssignmentService::new(&state).create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// GET /api/v1/teacher/assignments
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entries = AssignmentService::new(&state)
        .list_for_teacher(&actor, query)
        .await?;
    Ok(Json(entries))
}

/// GET /api/v1/teacher/assignments/needs-reinforcement
pub async fn list_needs_reinforcement(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let entries = ReportingService::new(&state)
        .needs_reinforcement(&actor)
        .await?;
    Ok(Json(entries))
}

/// GET /api/v1/teacher/assignments/{id}/summary
pub async fn get_assignment_summary(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let summary = ReportingService::new(&state)
        .assignment_summary(&actor, id)
        .await?;
    Ok(Json(summary))
}

/// GET /api/v1/teacher/assignments/{id}/submission
pub async fn get_assignment_submission(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let detail = SubmissionService::new(&state)
        .get_for_teacher(&actor, id)
        .await?;
    Ok(Json(detail))
}

/// GET /api/v1/teacher/assignments/{id}/reinforcements
pub async fn list_reinforcements(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let entries = AssignmentService::new(&state)
        .list_reinforcements(&actor, id)
        .await?;
    Ok(Json(entries))
}

/// POST /api/v1/teacher/assignments/{id}/reinforcement
///
/// The body is optional; an empty body selects every missed question.
pub async fn create_auto_reinforcement(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        AutoReinforcementRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            AppError::validation(format!("Failed to parse JSON request body: {}", e))
        })?
    };

    let outcome = ReinforcementService::new(&state)
        .create_auto(&actor, id, req)
        .await?;
    Ok(reinforcement_response(outcome))
}

/// POST /api/v1/teacher/assignments/{id}/reinforcement/manual/activity
pub async fn author_reinforcement_activity(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    AppJson(req): AppJson<CreateReinforcementActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let activity = ReinforcementService::new(&state)
        .author_manual_activity(&actor, id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// POST /api/v1/teacher/assignments/{id}/reinforcement/manual/assign
pub async fn assign_reinforcement_activity(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    AppJson(req): AppJson<AssignReinforcementActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let outcome = ReinforcementService::new(&state)
        .assign_manual_activity(&actor, id, req)
        .await?;
    Ok(reinforcement_response(outcome))
}

/// POST /api/v1/teacher/assignments/{id}/reinforcement/manual
pub async fn create_manual_reinforcement(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    AppJson(req): AppJson<ManualReinforcementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let outcome = ReinforcementService::new(&state)
        .create_manual(&actor, id, req)
        .await?;
    Ok(reinforcement_response(outcome))
}

/// GET /api/v1/teacher/submissions
pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListSubmissionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entries = ReportingService::new(&state)
        .list_submissions(&actor, query)
        .await?;
    Ok(Json(entries))
}

/// POST /api/v1/teacher/activities
pub async fn create_activity(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    AppJson(req): AppJson<CreateActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let activity = ActivityService::new(&state).create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// GET /api/v1/teacher/activities/{id}
pub async fn get_activity(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "activity")?;
    let activity = ActivityService::new(&state).get(&actor, id).await?;
    Ok(Json(activity))
}

/// 201 when a reinforcement was created, 200 for the "not needed" outcome.
fn reinforcement_response(outcome: ReinforcementOutcome) -> (StatusCode, Json<ReinforcementResponse>) {
    let status = match outcome {
        ReinforcementOutcome::Created { .. } => StatusCode::CREATED,
        ReinforcementOutcome::NotNeeded { .. } => StatusCode::OK,
    };
    (status, Json(outcome.into()))
}
