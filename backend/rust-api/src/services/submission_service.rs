use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    metrics,
    models::{
        assignment::AssignmentStatus,
        reporting::TeacherSubmissionDetail,
        submission::{SubmitAnswersRequest, SubmitAnswersResponse, Submission},
        user::Actor,
    },
    repositories::{ActivityCatalog, IdentityProvider, SubmissionRepository},
    services::{
        assignment_service::AssignmentService, grading, lookup::ReferenceCache, AppState,
    },
    utils::ids::new_id,
};

pub struct SubmissionService {
    activities: Arc<dyn ActivityCatalog>,
    identity: Arc<dyn IdentityProvider>,
    submissions: Arc<dyn SubmissionRepository>,
    lifecycle: AssignmentService,
}

impl SubmissionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            activities: state.activities.clone(),
            identity: state.identity.clone(),
            submissions: state.submissions.clone(),
            lifecycle: AssignmentService::new(state),
        }
    }

    /// Grades and stores the one submission an assignment may have.
    pub async fn submit(
        &self,
        actor: &Actor,
        assignment_id: &str,
        req: SubmitAnswersRequest,
    ) -> Result<SubmitAnswersResponse, AppError> {
        req.validate()?;

        let assignment = self.lifecycle.get_for_student(actor, assignment_id).await?;
        if assignment.status == AssignmentStatus::Closed {
            return Err(AppError::validation("Assignment is closed"));
        }

        let activity = self
            .activities
            .get_by_id(&assignment.activity_id)
            .await?
            .filter(|a| !a.questions.is_empty())
            .ok_or_else(|| AppError::not_found("Activity not found or has no questions"))?;

        let outcome = grading::grade(&activity.questions, &req.answers, activity.pass_threshold);

        let submission = Submission {
            id: new_id(),
            assignment_id: assignment.id.clone(),
            activity_id: activity.id.clone(),
            student_id: assignment.student_id.clone(),
            teacher_id: assignment.teacher_id.clone(),
            answers: req.answers,
            score: outcome.score,
            total: outcome.total,
            percent: outcome.percent,
            threshold: outcome.threshold,
            needs_reinforcement: outcome.needs_reinforcement,
            created_at: Utc::now(),
        };

        self.submissions.insert(&submission).await.map_err(|e| {
            tracing::warn!(assignment_id, "Submission rejected: {}", e);
            AppError::from(e)
        })?;

        if let Err(e) = self
            .lifecycle
            .record_submission(&assignment.id, &submission.id)
            .await
        {
            // The grade must not outlive a rejected status change.
            if let Err(cleanup) = self.submissions.delete(&submission.id).await {
                tracing::error!(
                    assignment_id,
                    submission_id = %submission.id,
                    "Failed to remove orphaned submission: {}",
                    cleanup
                );
            }
            return Err(e);
        }
        metrics::record_submission(submission.needs_reinforcement);

        tracing::info!(
            assignment_id,
            submission_id = %submission.id,
            score = submission.score,
            total = submission.total,
            percent = submission.percent,
            needs_reinforcement = submission.needs_reinforcement,
            "Submission graded"
        );

        Ok(SubmitAnswersResponse::from(&submission))
    }

    /// Submission of an assignment owned by the acting teacher.
    pub async fn get_for_teacher(
        &self,
        actor: &Actor,
        assignment_id: &str,
    ) -> Result<TeacherSubmissionDetail, AppError> {
        let assignment = self.lifecycle.get_for_teacher(actor, assignment_id).await?;
        let submission = self
            .submissions
            .find_by_assignment(&assignment.id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment has not been submitted"))?;

        let mut refs = ReferenceCache::new(self.identity.clone(), self.activities.clone());
        let student = refs.user(&submission.student_id).await?;
        let activity = match refs.activity(&submission.activity_id).await? {
            Some(_) => Some(refs.activity_ref(&submission.activity_id).await?),
            None => None,
        };

        Ok(TeacherSubmissionDetail {
            submission: submission.into(),
            student,
            activity,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        config::Config,
        models::{
            activity::{Activity, AnswerOption, OptionSet, Question},
            assignment::{Assignment, AssignmentFilter},
            user::{UserRecord, UserRole},
        },
        repositories::{
            memory::{
                InMemoryActivityCatalog, InMemoryAssignmentRepository, InMemoryDirectory,
                InMemorySubmissionRepository,
            },
            AssignmentRepository, StoreError,
        },
    };

    const TEACHER: &str = "650000000000000000000001";
    const STUDENT: &str = "650000000000000000000002";

    /// Assignment store whose status change always loses the race.
    struct StaleAssignments(InMemoryAssignmentRepository);

    #[async_trait]
    impl AssignmentRepository for StaleAssignments {
        async fn insert(&self, assignment: &Assignment) -> Result<(), StoreError> {
            self.0.insert(assignment).await
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Assignment>, StoreError> {
            self.0.find_by_id(id).await
        }

        async fn find(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, StoreError> {
            self.0.find(filter).await
        }

        async fn transition(
            &self,
            _id: &str,
            _from: &[AssignmentStatus],
            _to: AssignmentStatus,
            _submission_id: Option<&str>,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    async fn setup(assignments: Arc<dyn AssignmentRepository>) -> (AppState, String) {
        let directory = InMemoryDirectory::with_users([UserRecord {
            id: STUDENT.into(),
            name: "Carla Dias".into(),
            email: "carla@school.test".into(),
            role: UserRole::Student,
        }]);
        let state = AppState::with_repositories(
            Config::for_memory("secret"),
            Arc::new(InMemoryActivityCatalog::new()),
            Arc::new(directory),
            assignments,
            Arc::new(InMemorySubmissionRepository::new()),
        );

        let activity = state
            .activities
            .create(Activity {
                id: new_id(),
                description: "Frações".into(),
                questions: vec![Question {
                    statement: "1/2 + 1/2?".into(),
                    topic: "Matemática".into(),
                    options: OptionSet {
                        a: "1".into(),
                        b: "2".into(),
                        c: "0".into(),
                        d: "1/4".into(),
                        e: "3".into(),
                    },
                    correct_option: AnswerOption::A,
                }],
                pass_threshold: 70,
                is_reinforcement: false,
                origin_activity_id: None,
                created_by_teacher_id: Some(TEACHER.into()),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let assignment = Assignment {
            id: new_id(),
            activity_id: activity.id,
            student_id: STUDENT.into(),
            teacher_id: TEACHER.into(),
            status: AssignmentStatus::Assigned,
            due_at: None,
            submission_id: None,
            is_reinforcement: false,
            original_assignment_id: None,
            reinforcement_reason: None,
            created_at: Utc::now(),
        };
        state.assignments.insert(&assignment).await.unwrap();
        (state, assignment.id)
    }

    fn answers(answer: &str) -> SubmitAnswersRequest {
        SubmitAnswersRequest {
            answers: BTreeMap::from([("0".to_string(), answer.to_string())]),
        }
    }

    #[tokio::test]
    async fn test_submit_records_and_transitions() {
        let (state, assignment_id) =
            setup(Arc::new(InMemoryAssignmentRepository::new())).await;
        let service = SubmissionService::new(&state);

        let response = service
            .submit(&Actor::student(STUDENT), &assignment_id, answers("a"))
            .await
            .unwrap();
        assert_eq!(response.percent, 100);

        let stored = state.assignments.find_by_id(&assignment_id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssignmentStatus::Submitted);
        assert_eq!(stored.submission_id.as_deref(), Some(response.id.as_str()));
    }

    #[tokio::test]
    async fn test_failed_transition_removes_submission() {
        let (state, assignment_id) =
            setup(Arc::new(StaleAssignments(InMemoryAssignmentRepository::new()))).await;
        let service = SubmissionService::new(&state);

        let err = service
            .submit(&Actor::student(STUDENT), &assignment_id, answers("A"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert!(state
            .submissions
            .find_by_assignment(&assignment_id)
            .await
            .unwrap()
            .is_none());
        let stored = state.assignments.find_by_id(&assignment_id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssignmentStatus::Assigned);
        assert!(stored.submission_id.is_none());
    }
}
