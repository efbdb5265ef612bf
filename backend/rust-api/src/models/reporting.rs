use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    activity::{ActivityView, AnswerOption},
    assignment::{ActivityRef, AssignmentStatus, AssignmentView},
    submission::SubmissionView,
    user::UserSummary,
};

/// Per-question grading detail, recomputed from the stored answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRecord {
    pub index: usize,
    pub topic: String,
    pub statement: String,
    pub student_answer: Option<String>,
    pub correct_answer: AnswerOption,
    pub is_correct: bool,
}

/// Per-topic accuracy breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub topic: String,
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    pub accuracy_percent: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub total_questions: u32,
    pub correct: u32,
    pub wrong: u32,
    pub accuracy_percent: u32,
    pub all_correct: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongQuestion {
    pub index: usize,
    pub topic: String,
    pub statement: String,
    pub student_answer: Option<String>,
    pub correct_answer: AnswerOption,
}

/// Consolidated teacher view of one assignment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSummaryResponse {
    pub assignment: AssignmentView,
    pub student: Option<UserSummary>,
    pub activity: ActivityView,
    pub submission: Option<SubmissionView>,
    pub performance: Option<Performance>,
    pub topics_to_improve: Option<Vec<TopicSummary>>,
    pub wrong_questions: Option<Vec<WrongQuestion>>,
    pub correction: Option<Vec<CorrectionRecord>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedsReinforcementEntry {
    pub assignment_id: String,
    pub assignment_status: Option<AssignmentStatus>,
    pub student: UserSummary,
    pub activity: ActivityRef,
    pub percent: u32,
    pub threshold: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSubmissionEntry {
    pub id: String,
    pub assignment_id: String,
    pub student: UserSummary,
    pub activity: ActivityRef,
    pub score: u32,
    pub total: u32,
    pub percent: u32,
    pub threshold: u32,
    pub needs_reinforcement: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSubmissionDetail {
    #[serde(flatten)]
    pub submission: SubmissionView,
    pub student: Option<UserSummary>,
    pub activity: Option<ActivityRef>,
}
