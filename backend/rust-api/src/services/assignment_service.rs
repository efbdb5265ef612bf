use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    error::AppError,
    metrics,
    models::{
        activity::StudentActivityView,
        assignment::{
            Assignment, AssignmentFilter, AssignmentStatus, AssignmentView,
            CreateAssignmentRequest, ListAssignmentsQuery, ReinforcementReason,
            StudentAssignmentView, TeacherAssignmentEntry,
        },
        reinforcement::ReinforcementListEntry,
        user::{Actor, UserRole},
    },
    repositories::{ActivityCatalog, AssignmentRepository, IdentityProvider},
    services::{lookup::ReferenceCache, AppState},
    utils::ids::new_id,
};

/// Owns the assignment state machine and the ownership rules around it.
pub struct AssignmentService {
    activities: Arc<dyn ActivityCatalog>,
    identity: Arc<dyn IdentityProvider>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl AssignmentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            activities: state.activities.clone(),
            identity: state.identity.clone(),
            assignments: state.assignments.clone(),
        }
    }

    /// Assign an activity to a student.
    pub async fn create(
        &self,
        actor: &Actor,
        req: CreateAssignmentRequest,
    ) -> Result<AssignmentView, AppError> {
        actor.require_teacher()?;
        req.validate()?;

        if self.activities.get_by_id(&req.activity_id).await?.is_none() {
            return Err(AppError::not_found("Activity not found"));
        }

        let role = self
            .identity
            .get_role(&req.student_id)
            .await?
            .ok_or_else(|| AppError::not_found("Student not found"))?;
        if role != UserRole::Student {
            tracing::warn!(
                user_id = %req.student_id,
                role = role.as_str(),
                "Refusing to assign activity to a non-student"
            );
            return Err(AppError::forbidden(
                "Activities can only be assigned to students",
            ));
        }

        let assignment = Assignment {
            id: new_id(),
            activity_id: req.activity_id,
            student_id: req.student_id,
            teacher_id: actor.user_id.clone(),
            status: AssignmentStatus::Assigned,
            due_at: req.due_at,
            submission_id: None,
            is_reinforcement: false,
            original_assignment_id: None,
            reinforcement_reason: None,
            created_at: Utc::now(),
        };

        self.assignments.insert(&assignment).await.map_err(|e| {
            tracing::warn!(
                activity_id = %assignment.activity_id,
                student_id = %assignment.student_id,
                "Assignment insert rejected: {}",
                e
            );
            AppError::from(e)
        })?;
        metrics::record_assignment_created(false);

        tracing::info!(
            assignment_id = %assignment.id,
            activity_id = %assignment.activity_id,
            student_id = %assignment.student_id,
            "Assignment created"
        );

        Ok(assignment.into())
    }

    /// `ASSIGNED -> SUBMITTED`, attaching the submission id.
    pub async fn record_submission(
        &self,
        assignment_id: &str,
        submission_id: &str,
    ) -> Result<(), AppError> {
        let moved = self
            .assignments
            .transition(
                assignment_id,
                AssignmentStatus::predecessors(AssignmentStatus::Submitted),
                AssignmentStatus::Submitted,
                Some(submission_id),
            )
            .await?;

        if !moved {
            tracing::warn!(
                assignment_id,
                submission_id,
                "Assignment left ASSIGNED before the submission was recorded"
            );
            return Err(AppError::conflict(
                "Assignment is no longer awaiting a submission",
            ));
        }

        tracing::info!(assignment_id, submission_id, "Assignment submitted");
        Ok(())
    }

    /// Moves the original to `REINFORCEMENT_ASSIGNED`; the submission id is kept.
    pub async fn link_reinforcement(
        &self,
        original_assignment_id: &str,
        reinforcement_assignment_id: &str,
    ) -> Result<(), AppError> {
        let moved = self
            .assignments
            .transition(
                original_assignment_id,
                AssignmentStatus::predecessors(AssignmentStatus::ReinforcementAssigned),
                AssignmentStatus::ReinforcementAssigned,
                None,
            )
            .await?;

        if !moved {
            tracing::error!(
                original_assignment_id,
                reinforcement_assignment_id,
                "Reinforcement created but original assignment could not be linked"
            );
            return Err(AppError::Internal(anyhow!(
                "assignment {} could not be linked to reinforcement {}",
                original_assignment_id,
                reinforcement_assignment_id
            )));
        }

        tracing::info!(
            original_assignment_id,
            reinforcement_assignment_id,
            "Reinforcement linked"
        );
        Ok(())
    }

    /// Inserts the follow-up assignment for a reinforcement activity.
    pub async fn create_reinforcement_assignment(
        &self,
        actor: &Actor,
        original: &Assignment,
        activity_id: &str,
        due_at: Option<DateTime<Utc>>,
        reason: Option<ReinforcementReason>,
    ) -> Result<Assignment, AppError> {
        let assignment = Assignment {
            id: new_id(),
            activity_id: activity_id.to_string(),
            student_id: original.student_id.clone(),
            teacher_id: actor.user_id.clone(),
            status: AssignmentStatus::Assigned,
            due_at,
            submission_id: None,
            is_reinforcement: true,
            original_assignment_id: Some(original.id.clone()),
            reinforcement_reason: reason,
            created_at: Utc::now(),
        };

        self.assignments.insert(&assignment).await?;
        metrics::record_assignment_created(true);

        tracing::info!(
            assignment_id = %assignment.id,
            original_assignment_id = %original.id,
            activity_id,
            "Reinforcement assignment created"
        );
        Ok(assignment)
    }

    /// Loads an assignment owned by the acting teacher.
    pub async fn get_for_teacher(&self, actor: &Actor, id: &str) -> Result<Assignment, AppError> {
        actor.require_teacher()?;
        let assignment = self
            .assignments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment not found"))?;

        if assignment.teacher_id != actor.user_id {
            tracing::warn!(
                assignment_id = id,
                user_id = %actor.user_id,
                "Teacher does not own assignment"
            );
            return Err(AppError::forbidden(
                "You are not the teacher of this assignment",
            ));
        }
        Ok(assignment)
    }

    /// Loads an assignment addressed to the acting student.
    pub async fn get_for_student(&self, actor: &Actor, id: &str) -> Result<Assignment, AppError> {
        actor.require_student()?;
        let assignment = self
            .assignments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment not found"))?;

        if assignment.student_id != actor.user_id {
            tracing::warn!(
                assignment_id = id,
                user_id = %actor.user_id,
                "Student does not own assignment"
            );
            return Err(AppError::forbidden("This assignment is not yours"));
        }
        Ok(assignment)
    }

    /// A reinforcement cannot itself be reinforced.
    pub fn ensure_reinforceable(assignment: &Assignment) -> Result<(), AppError> {
        if assignment.is_reinforcement {
            return Err(AppError::validation(
                "Cannot create a reinforcement from a reinforcement assignment",
            ));
        }
        Ok(())
    }

    /// The original must be graded before a reinforcement can be linked to it.
    pub fn ensure_linkable(assignment: &Assignment) -> Result<(), AppError> {
        if assignment
            .status
            .can_transition_to(AssignmentStatus::ReinforcementAssigned)
        {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Assignment in status {} cannot receive a reinforcement",
                assignment.status.as_str()
            )))
        }
    }

    pub async fn list_for_teacher(
        &self,
        actor: &Actor,
        query: ListAssignmentsQuery,
    ) -> Result<Vec<TeacherAssignmentEntry>, AppError> {
        actor.require_teacher()?;
        let filter = AssignmentFilter {
            teacher_id: Some(actor.user_id.clone()),
            student_id: query.student_id,
            activity_id: query.activity_id,
            status: query.status,
            ..Default::default()
        };

        let assignments = self.assignments.find(&filter).await?;
        let mut refs = self.reference_cache();
        let mut entries = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let student = refs.user_or_unknown(&assignment.student_id).await?;
            let activity = refs.activity_ref(&assignment.activity_id).await?;
            entries.push(TeacherAssignmentEntry {
                assignment: assignment.into(),
                student,
                activity,
            });
        }
        Ok(entries)
    }

    pub async fn list_for_student(
        &self,
        actor: &Actor,
    ) -> Result<Vec<StudentAssignmentView>, AppError> {
        actor.require_student()?;
        let filter = AssignmentFilter {
            student_id: Some(actor.user_id.clone()),
            ..Default::default()
        };

        let assignments = self.assignments.find(&filter).await?;
        let mut refs = self.reference_cache();
        let mut views = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let activity = refs.activity(&assignment.activity_id).await?;
            views.push(student_view(assignment, activity.as_ref().map(Into::into)));
        }
        Ok(views)
    }

    pub async fn get_student_view(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<StudentAssignmentView, AppError> {
        let assignment = self.get_for_student(actor, id).await?;
        let activity = self.activities.get_by_id(&assignment.activity_id).await?;
        Ok(student_view(assignment, activity.as_ref().map(Into::into)))
    }

    /// Reinforcements linked to an original assignment, newest first.
    pub async fn list_reinforcements(
        &self,
        actor: &Actor,
        original_id: &str,
    ) -> Result<Vec<ReinforcementListEntry>, AppError> {
        let original = self.get_for_teacher(actor, original_id).await?;
        let filter = AssignmentFilter {
            is_reinforcement: Some(true),
            original_assignment_id: Some(original.id),
            ..Default::default()
        };

        let linked = self.assignments.find(&filter).await?;
        let mut refs = self.reference_cache();
        let mut entries = Vec::with_capacity(linked.len());
        for assignment in linked {
            let activity = refs.activity_ref(&assignment.activity_id).await?;
            entries.push(ReinforcementListEntry {
                id: assignment.id,
                status: assignment.status,
                created_at: assignment.created_at,
                due_at: assignment.due_at,
                activity,
            });
        }
        Ok(entries)
    }

    fn reference_cache(&self) -> ReferenceCache {
        ReferenceCache::new(self.identity.clone(), self.activities.clone())
    }
}

fn student_view(
    assignment: Assignment,
    activity: Option<StudentActivityView>,
) -> StudentAssignmentView {
    StudentAssignmentView {
        assignment_id: assignment.id,
        status: assignment.status,
        is_reinforcement: assignment.is_reinforcement,
        original_assignment_id: assignment.original_assignment_id,
        due_at: assignment.due_at,
        activity,
    }
}
