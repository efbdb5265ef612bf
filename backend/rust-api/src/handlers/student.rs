use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppError,
    extractors::AppJson,
    models::{submission::SubmitAnswersRequest, user::Actor},
    services::{
        assignment_service::AssignmentService, submission_service::SubmissionService, AppState,
    },
    utils::ids::parse_id,
};

/// GET /api/v1/student/assignments
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let views = AssignmentService::new(&state).list_for_student(&actor).await?;
    Ok(Json(views))
}

/// GET /api/v1/student/assignments/{id}
pub async fn get_assignment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let view = AssignmentService::new(&state)
        .get_student_view(&actor, id)
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/student/assignments/{id}/submit
pub async fn submit_answers(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    AppJson(req): AppJson<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "assignment")?;
    let result = SubmissionService::new(&state)
        .submit(&actor, id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}
