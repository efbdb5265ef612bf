use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    activity::Question,
    assignment::{ActivityRef, AssignmentStatus},
};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AutoReinforcementRequest {
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[validate(range(min = 1, message = "questionCount must be at least 1"))]
    pub question_count: Option<u32>,
    pub due_at: Option<DateTime<Utc>>,
}

/// Hand-written questionnaire for a reinforcement activity.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReinforcementActivityRequest {
    /// Trimmed and cut to 180 characters when stored.
    pub description: String,
    #[validate(length(min = 1, message = "Questionnaire must have at least one question"), nested)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignReinforcementActivityRequest {
    #[validate(length(min = 1, message = "activityId is required"))]
    pub activity_id: String,
    pub due_at: Option<DateTime<Utc>>,
}

/// Author and assign a manual reinforcement in one request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualReinforcementRequest {
    /// Trimmed and cut to 180 characters when stored.
    pub description: String,
    #[validate(length(min = 1, message = "Questionnaire must have at least one question"), nested)]
    pub questions: Vec<Question>,
    pub due_at: Option<DateTime<Utc>>,
}

/// The derived activity/assignment pair produced by a reinforcement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReinforcement {
    pub assignment_id: String,
    pub activity_id: String,
    pub description: String,
    pub question_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    pub status: AssignmentStatus,
    pub due_at: Option<DateTime<Utc>>,
}

/// Result of a reinforcement request. `NotNeeded` is a business outcome,
/// not an error: the student answered every question correctly.
#[derive(Debug, Clone)]
pub enum ReinforcementOutcome {
    Created {
        original_assignment_id: String,
        student_id: String,
        reinforcement: CreatedReinforcement,
    },
    NotNeeded {
        original_assignment_id: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinforcementResponse {
    pub created: bool,
    pub original_assignment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reinforcement: Option<CreatedReinforcement>,
}

impl From<ReinforcementOutcome> for ReinforcementResponse {
    fn from(outcome: ReinforcementOutcome) -> Self {
        match outcome {
            ReinforcementOutcome::Created {
                original_assignment_id,
                student_id,
                reinforcement,
            } => ReinforcementResponse {
                created: true,
                original_assignment_id,
                student_id: Some(student_id),
                message: None,
                reinforcement: Some(reinforcement),
            },
            ReinforcementOutcome::NotNeeded {
                original_assignment_id,
            } => ReinforcementResponse {
                created: false,
                original_assignment_id,
                student_id: None,
                message: Some(
                    "Student answered every question correctly. Reinforcement is not needed."
                        .to_string(),
                ),
                reinforcement: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinforcementActivityResponse {
    pub activity_id: String,
    pub description: String,
    pub question_count: usize,
    pub origin_activity_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinforcementListEntry {
    pub id: String,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub due_at: Option<DateTime<Utc>>,
    pub activity: ActivityRef,
}
