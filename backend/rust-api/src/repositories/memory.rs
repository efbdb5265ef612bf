use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    ActivityCatalog, AssignmentRepository, IdentityProvider, StoreError, SubmissionRepository,
};
use crate::models::{
    activity::Activity,
    assignment::{Assignment, AssignmentFilter, AssignmentStatus},
    submission::Submission,
    user::UserRecord,
};

#[derive(Default)]
pub struct InMemoryActivityCatalog {
    activities: RwLock<HashMap<String, Activity>>,
}

impl InMemoryActivityCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityCatalog for InMemoryActivityCatalog {
    async fn create(&self, activity: Activity) -> Result<Activity, StoreError> {
        let mut activities = self.activities.write().await;
        if activities.contains_key(&activity.id) {
            return Err(StoreError::Duplicate(format!(
                "Activity {} already exists",
                activity.id
            )));
        }
        activities.insert(activity.id.clone(), activity.clone());
        Ok(activity)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Activity>, StoreError> {
        Ok(self.activities.read().await.get(id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }

    pub async fn insert(&self, user: UserRecord) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryDirectory {
    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    assignments: RwLock<HashMap<String, Assignment>>,
}

impl InMemoryAssignmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn insert(&self, assignment: &Assignment) -> Result<(), StoreError> {
        // Check and insert under one write lock, mirroring a unique index.
        let mut assignments = self.assignments.write().await;
        if assignments.contains_key(&assignment.id) {
            return Err(StoreError::Duplicate(format!(
                "Assignment {} already exists",
                assignment.id
            )));
        }
        if !assignment.is_reinforcement {
            let duplicate = assignments.values().any(|existing| {
                !existing.is_reinforcement
                    && existing.teacher_id == assignment.teacher_id
                    && existing.activity_id == assignment.activity_id
                    && existing.student_id == assignment.student_id
            });
            if duplicate {
                return Err(StoreError::Duplicate(
                    "Duplicate assignment for this teacher, activity and student".to_string(),
                ));
            }
        }
        assignments.insert(assignment.id.clone(), assignment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Assignment>, StoreError> {
        Ok(self.assignments.read().await.get(id).cloned())
    }

    async fn find(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, StoreError> {
        let assignments = self.assignments.read().await;
        let mut matching: Vec<Assignment> = assignments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        matching.sort_by(|x, y| y.id.cmp(&x.id));
        Ok(matching)
    }

    async fn transition(
        &self,
        id: &str,
        from: &[AssignmentStatus],
        to: AssignmentStatus,
        submission_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut assignments = self.assignments.write().await;
        match assignments.get_mut(id) {
            Some(assignment) if from.contains(&assignment.status) => {
                assignment.status = to;
                if let Some(submission_id) = submission_id {
                    assignment.submission_id = Some(submission_id.to_string());
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<HashMap<String, Submission>>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError> {
        // Keyed by assignment id: the map itself is the uniqueness constraint.
        let mut submissions = self.submissions.write().await;
        if submissions.contains_key(&submission.assignment_id) {
            return Err(StoreError::Duplicate(
                "This assignment has already been submitted".to_string(),
            ));
        }
        submissions.insert(submission.assignment_id.clone(), submission.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.submissions.write().await.retain(|_, s| s.id != id);
        Ok(())
    }

    async fn find_by_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Option<Submission>, StoreError> {
        Ok(self.submissions.read().await.get(assignment_id).cloned())
    }

    async fn find_by_teacher(
        &self,
        teacher_id: &str,
        needs_reinforcement: Option<bool>,
    ) -> Result<Vec<Submission>, StoreError> {
        let submissions = self.submissions.read().await;
        let mut matching: Vec<Submission> = submissions
            .values()
            .filter(|s| s.teacher_id == teacher_id)
            .filter(|s| needs_reinforcement.is_none_or(|flag| flag == s.needs_reinforcement))
            .cloned()
            .collect();
        matching.sort_by(|x, y| y.id.cmp(&x.id));
        Ok(matching)
    }
}
