use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::time::bson_datetime;

/// Graded answer set stored in the "submissions" collection.
/// Written once; `assignment_id` is unique across the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(rename = "_id")]
    pub id: String,
    pub assignment_id: String,
    pub activity_id: String,
    pub student_id: String,
    pub teacher_id: String,
    /// Question index (as a string) -> chosen option.
    pub answers: BTreeMap<String, String>,
    pub score: u32,
    pub total: u32,
    pub percent: u32,
    pub threshold: u32,
    pub needs_reinforcement: bool,
    #[serde(with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswersRequest {
    #[validate(length(min = 1, message = "At least one answer is required"))]
    pub answers: BTreeMap<String, String>,
}

/// Filter for the teacher submissions dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubmissionsQuery {
    pub needs_reinforcement: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersResponse {
    pub id: String,
    pub assignment_id: String,
    pub submitted: bool,
    pub score: u32,
    pub total: u32,
    pub percent: u32,
    pub threshold: u32,
    pub needs_reinforcement: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Submission> for SubmitAnswersResponse {
    fn from(s: &Submission) -> Self {
        SubmitAnswersResponse {
            id: s.id.clone(),
            assignment_id: s.assignment_id.clone(),
            submitted: true,
            score: s.score,
            total: s.total,
            percent: s.percent,
            threshold: s.threshold,
            needs_reinforcement: s.needs_reinforcement,
            created_at: s.created_at,
        }
    }
}

/// Submission as shown to the owning teacher.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: String,
    pub assignment_id: String,
    pub answers: BTreeMap<String, String>,
    pub score: u32,
    pub total: u32,
    pub percent: u32,
    pub threshold: u32,
    pub needs_reinforcement: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionView {
    fn from(s: Submission) -> Self {
        SubmissionView {
            id: s.id,
            assignment_id: s.assignment_id,
            answers: s.answers,
            score: s.score,
            total: s.total,
            percent: s.percent,
            threshold: s.threshold,
            needs_reinforcement: s.needs_reinforcement,
            created_at: s.created_at,
        }
    }
}
