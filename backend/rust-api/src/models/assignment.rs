use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{activity::StudentActivityView, user::UserSummary};
use crate::utils::time::{bson_datetime, bson_datetime_option};

/// Assignment lifecycle: `Assigned -> Submitted -> ReinforcementAssigned`.
/// `Closed` is terminal and is only ever set administratively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Assigned,
    Submitted,
    ReinforcementAssigned,
    Closed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "ASSIGNED",
            AssignmentStatus::Submitted => "SUBMITTED",
            AssignmentStatus::ReinforcementAssigned => "REINFORCEMENT_ASSIGNED",
            AssignmentStatus::Closed => "CLOSED",
        }
    }

    /// Statuses from which a transition into `target` is legal.
    pub fn predecessors(target: AssignmentStatus) -> &'static [AssignmentStatus] {
        match target {
            AssignmentStatus::Assigned => &[],
            AssignmentStatus::Submitted => &[AssignmentStatus::Assigned],
            AssignmentStatus::ReinforcementAssigned => &[
                AssignmentStatus::Submitted,
                AssignmentStatus::ReinforcementAssigned,
            ],
            AssignmentStatus::Closed => &[
                AssignmentStatus::Assigned,
                AssignmentStatus::Submitted,
                AssignmentStatus::ReinforcementAssigned,
            ],
        }
    }

    pub fn can_transition_to(&self, target: AssignmentStatus) -> bool {
        Self::predecessors(target).contains(self)
    }
}

/// Context recorded on an automatically generated reinforcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinforcementReason {
    pub percent: u32,
    pub threshold: u32,
    pub topics_to_improve: Vec<String>,
}

/// Assignment document stored in the "assignments" collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "_id")]
    pub id: String,
    pub activity_id: String,
    pub student_id: String,
    pub teacher_id: String,
    pub status: AssignmentStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_option"
    )]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(default)]
    pub is_reinforcement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_assignment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinforcement_reason: Option<ReinforcementReason>,
    #[serde(with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Query filter for assignment listings; `None` fields are not constrained.
#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub teacher_id: Option<String>,
    pub student_id: Option<String>,
    pub activity_id: Option<String>,
    pub status: Option<AssignmentStatus>,
    pub is_reinforcement: Option<bool>,
    pub original_assignment_id: Option<String>,
}

impl AssignmentFilter {
    pub fn matches(&self, assignment: &Assignment) -> bool {
        fn eq(expected: &Option<String>, actual: &str) -> bool {
            expected.as_deref().is_none_or(|value| value == actual)
        }

        eq(&self.teacher_id, &assignment.teacher_id)
            && eq(&self.student_id, &assignment.student_id)
            && eq(&self.activity_id, &assignment.activity_id)
            && self.status.is_none_or(|s| s == assignment.status)
            && self
                .is_reinforcement
                .is_none_or(|flag| flag == assignment.is_reinforcement)
            && self.original_assignment_id.as_deref().is_none_or(|id| {
                assignment.original_assignment_id.as_deref() == Some(id)
            })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, message = "activityId is required"))]
    pub activity_id: String,
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssignmentsQuery {
    pub activity_id: Option<String>,
    pub student_id: Option<String>,
    pub status: Option<AssignmentStatus>,
}

/// Assignment fields common to every teacher-facing response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub id: String,
    pub activity_id: String,
    pub student_id: String,
    pub teacher_id: String,
    pub status: AssignmentStatus,
    pub due_at: Option<DateTime<Utc>>,
    pub submission_id: Option<String>,
    pub is_reinforcement: bool,
    pub original_assignment_id: Option<String>,
    pub reinforcement_reason: Option<ReinforcementReason>,
    pub created_at: DateTime<Utc>,
}

impl From<Assignment> for AssignmentView {
    fn from(a: Assignment) -> Self {
        AssignmentView {
            id: a.id,
            activity_id: a.activity_id,
            student_id: a.student_id,
            teacher_id: a.teacher_id,
            status: a.status,
            due_at: a.due_at,
            submission_id: a.submission_id,
            is_reinforcement: a.is_reinforcement,
            original_assignment_id: a.original_assignment_id,
            reinforcement_reason: a.reinforcement_reason,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRef {
    pub id: String,
    pub description: String,
}

/// Teacher listing entry with populated student and activity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAssignmentEntry {
    #[serde(flatten)]
    pub assignment: AssignmentView,
    pub student: UserSummary,
    pub activity: ActivityRef,
}

/// Student-facing assignment; the embedded activity has no answer key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignmentView {
    pub assignment_id: String,
    pub status: AssignmentStatus,
    pub is_reinforcement: bool,
    pub original_assignment_id: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub activity: Option<StudentActivityView>,
}
