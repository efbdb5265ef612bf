use std::sync::Arc;

use crate::{
    error::AppError,
    models::{
        reporting::{
            AssignmentSummaryResponse, CorrectionRecord, NeedsReinforcementEntry, Performance,
            TeacherSubmissionEntry, WrongQuestion,
        },
        submission::ListSubmissionsQuery,
        user::Actor,
    },
    repositories::{ActivityCatalog, AssignmentRepository, IdentityProvider, SubmissionRepository},
    services::{
        assignment_service::AssignmentService, grading, lookup::ReferenceCache,
        topic_report::summarize_topics, AppState,
    },
    utils::text::topic_label,
};

/// Read-only teacher reports over assignments and their submissions.
pub struct ReportingService {
    activities: Arc<dyn ActivityCatalog>,
    identity: Arc<dyn IdentityProvider>,
    assignments: Arc<dyn AssignmentRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    lifecycle: AssignmentService,
}

impl ReportingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            activities: state.activities.clone(),
            identity: state.identity.clone(),
            assignments: state.assignments.clone(),
            submissions: state.submissions.clone(),
            lifecycle: AssignmentService::new(state),
        }
    }

    /// Assignment, student, activity and, once submitted, the graded breakdown.
    pub async fn assignment_summary(
        &self,
        actor: &Actor,
        assignment_id: &str,
    ) -> Result<AssignmentSummaryResponse, AppError> {
        let assignment = self.lifecycle.get_for_teacher(actor, assignment_id).await?;
        let mut refs = self.reference_cache();

        let student = refs.user(&assignment.student_id).await?;
        let activity = refs
            .activity(&assignment.activity_id)
            .await?
            .ok_or_else(|| AppError::not_found("Activity not found"))?;
        let submission = self.submissions.find_by_assignment(&assignment.id).await?;

        let mut summary = AssignmentSummaryResponse {
            assignment: assignment.into(),
            student,
            activity: activity.clone().into(),
            submission: None,
            performance: None,
            topics_to_improve: None,
            wrong_questions: None,
            correction: None,
        };

        if let Some(submission) = submission {
            let correction = grading::correction_records(&activity.questions, &submission.answers);
            summary.performance = Some(performance(&correction));
            summary.topics_to_improve = Some(summarize_topics(&correction));
            summary.wrong_questions = Some(wrong_questions(&correction));
            summary.correction = Some(correction);
            summary.submission = Some(submission.into());
        }

        Ok(summary)
    }

    /// Submissions of the acting teacher flagged below threshold, newest first.
    pub async fn needs_reinforcement(
        &self,
        actor: &Actor,
    ) -> Result<Vec<NeedsReinforcementEntry>, AppError> {
        actor.require_teacher()?;
        let flagged = self
            .submissions
            .find_by_teacher(&actor.user_id, Some(true))
            .await?;

        let mut refs = self.reference_cache();
        let mut entries = Vec::with_capacity(flagged.len());
        for submission in flagged {
            let assignment_status = self
                .assignments
                .find_by_id(&submission.assignment_id)
                .await?
                .map(|a| a.status);
            entries.push(NeedsReinforcementEntry {
                assignment_id: submission.assignment_id,
                assignment_status,
                student: refs.user_or_unknown(&submission.student_id).await?,
                activity: refs.activity_ref(&submission.activity_id).await?,
                percent: submission.percent,
                threshold: submission.threshold,
                created_at: submission.created_at,
            });
        }
        Ok(entries)
    }

    /// Dashboard of every submission received by the acting teacher.
    pub async fn list_submissions(
        &self,
        actor: &Actor,
        query: ListSubmissionsQuery,
    ) -> Result<Vec<TeacherSubmissionEntry>, AppError> {
        actor.require_teacher()?;
        let submissions = self
            .submissions
            .find_by_teacher(&actor.user_id, query.needs_reinforcement)
            .await?;

        let mut refs = self.reference_cache();
        let mut entries = Vec::with_capacity(submissions.len());
        for submission in submissions {
            entries.push(TeacherSubmissionEntry {
                student: refs.user_or_unknown(&submission.student_id).await?,
                activity: refs.activity_ref(&submission.activity_id).await?,
                id: submission.id,
                assignment_id: submission.assignment_id,
                score: submission.score,
                total: submission.total,
                percent: submission.percent,
                threshold: submission.threshold,
                needs_reinforcement: submission.needs_reinforcement,
                created_at: submission.created_at,
            });
        }
        Ok(entries)
    }

    fn reference_cache(&self) -> ReferenceCache {
        ReferenceCache::new(self.identity.clone(), self.activities.clone())
    }
}

fn performance(correction: &[CorrectionRecord]) -> Performance {
    let total = correction.len() as u32;
    let correct = correction.iter().filter(|r| r.is_correct).count() as u32;
    let wrong = total - correct;
    let all_correct = total > 0 && wrong == 0;

    let message = if all_correct {
        "Student answered every question correctly.".to_string()
    } else {
        format!("Student missed {} of {} questions.", wrong, total)
    };

    Performance {
        total_questions: total,
        correct,
        wrong,
        accuracy_percent: grading::percent(correct, total),
        all_correct,
        message,
    }
}

fn wrong_questions(correction: &[CorrectionRecord]) -> Vec<WrongQuestion> {
    correction
        .iter()
        .filter(|r| !r.is_correct)
        .map(|r| WrongQuestion {
            index: r.index,
            topic: topic_label(&r.topic),
            statement: r.statement.clone(),
            student_answer: r.student_answer.clone(),
            correct_answer: r.correct_answer,
        })
        .collect()
}
