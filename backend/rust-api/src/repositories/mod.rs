//! Storage seams for the assignment workflow.
//!
//! Each trait has a MongoDB implementation ([`mongo`]) used in production and
//! an in-memory one ([`memory`]) used by tests and local runs. Both enforce the
//! same uniqueness rules at insert time: one submission per assignment, and one
//! non-reinforcement assignment per (teacher, activity, student).

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    activity::Activity,
    assignment::{Assignment, AssignmentFilter, AssignmentStatus},
    submission::Submission,
    user::{UserRecord, UserRole},
};

pub mod memory;
pub mod mongo;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Quiz definitions. Activities are immutable once created.
#[async_trait]
pub trait ActivityCatalog: Send + Sync {
    async fn create(&self, activity: Activity) -> Result<Activity, StoreError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Activity>, StoreError>;
}

/// Read-only view of the user directory.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn get_role(&self, id: &str) -> Result<Option<UserRole>, StoreError> {
        Ok(self.find_user(id).await?.map(|user| user.role))
    }
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Atomic insert-or-fail; a second non-reinforcement assignment for the
    /// same (teacher, activity, student) yields [`StoreError::Duplicate`].
    async fn insert(&self, assignment: &Assignment) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Assignment>, StoreError>;

    /// Newest first.
    async fn find(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, StoreError>;

    /// Compare-and-set on status: moves the assignment to `to` only when its
    /// current status is one of `from`. Returns whether a record was updated.
    async fn transition(
        &self,
        id: &str,
        from: &[AssignmentStatus],
        to: AssignmentStatus,
        submission_id: Option<&str>,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Atomic insert-or-fail on `assignment_id`.
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError>;

    /// Removes a submission by id; used to undo an insert whose follow-up failed.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn find_by_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Option<Submission>, StoreError>;

    /// Newest first, optionally restricted by the needs-reinforcement flag.
    async fn find_by_teacher(
        &self,
        teacher_id: &str,
        needs_reinforcement: Option<bool>,
    ) -> Result<Vec<Submission>, StoreError>;
}
