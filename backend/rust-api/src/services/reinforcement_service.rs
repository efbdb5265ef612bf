//! Reinforcement: a derived activity re-testing what a student got wrong,
//! assigned as a follow-up to the original assignment.
//!
//! Writes happen in order (activity, assignment, status update) without a
//! transaction. A failure after the activity insert leaves an orphaned
//! activity behind; it is logged and otherwise ignored.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    error::AppError,
    metrics,
    models::{
        activity::{Activity, Question, DESCRIPTION_MAX_CHARS},
        assignment::{Assignment, ReinforcementReason},
        reinforcement::{
            AssignReinforcementActivityRequest, AutoReinforcementRequest,
            CreateReinforcementActivityRequest, CreatedReinforcement,
            ManualReinforcementRequest, ReinforcementActivityResponse, ReinforcementOutcome,
        },
        user::Actor,
    },
    repositories::{ActivityCatalog, SubmissionRepository},
    services::{assignment_service::AssignmentService, grading, AppState},
    utils::{
        ids::new_id,
        text::{topic_key, truncate_chars, UNCATEGORIZED_TOPIC},
    },
};

/// Questions taken when the caller does not ask for a specific count.
pub const DEFAULT_QUESTION_CAP: usize = 10;

const DESCRIPTION_PREFIX: &str = "Reinforcement: ";

/// Result of picking questions for an automatic reinforcement.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Every question was answered correctly.
    NotNeeded,
    Selected {
        questions: Vec<Question>,
        /// Display labels of the targeted topics, in question order.
        topics: Vec<String>,
    },
}

/// Picks wrongly answered questions, restricted to `requested_topics` when
/// any non-blank topic is given, keeping the original question order.
pub fn select_questions(
    questions: &[Question],
    answers: &BTreeMap<String, String>,
    requested_topics: Option<&[String]>,
    question_count: Option<u32>,
) -> Result<Selection, AppError> {
    let wrong: Vec<(String, &Question)> = questions
        .iter()
        .enumerate()
        .filter(|(idx, q)| {
            !grading::answer_matches(grading::answer_at(answers, *idx), q.correct_option)
        })
        .map(|(_, q)| (topic_key(&q.topic), q))
        .collect();

    if wrong.is_empty() {
        return Ok(Selection::NotNeeded);
    }

    let requested: Vec<String> = requested_topics
        .unwrap_or_default()
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| topic_key(t))
        .collect();

    let candidates: Vec<&(String, &Question)> = wrong
        .iter()
        .filter(|(key, _)| requested.is_empty() || requested.contains(key))
        .collect();

    if candidates.is_empty() {
        return Err(AppError::validation(
            "No wrongly answered question matches the selected topics",
        ));
    }

    let limit = match question_count {
        Some(count) => count as usize,
        None => DEFAULT_QUESTION_CAP.min(candidates.len()),
    };

    let mut topic_keys: Vec<&str> = Vec::new();
    let mut topics = Vec::new();
    for (key, question) in &candidates {
        if !topic_keys.contains(&key.as_str()) {
            topic_keys.push(key);
            let label = question.topic.trim();
            topics.push(if label.is_empty() {
                UNCATEGORIZED_TOPIC.to_string()
            } else {
                label.to_string()
            });
        }
    }

    Ok(Selection::Selected {
        questions: candidates
            .into_iter()
            .take(limit)
            .map(|(_, q)| (*q).clone())
            .collect(),
        topics,
    })
}

pub struct ReinforcementService {
    activities: Arc<dyn ActivityCatalog>,
    submissions: Arc<dyn SubmissionRepository>,
    lifecycle: AssignmentService,
}

impl ReinforcementService {
    pub fn new(state: &AppState) -> Self {
        Self {
            activities: state.activities.clone(),
            submissions: state.submissions.clone(),
            lifecycle: AssignmentService::new(state),
        }
    }

    /// Builds a reinforcement from the questions the student missed.
    pub async fn create_auto(
        &self,
        actor: &Actor,
        original_id: &str,
        req: AutoReinforcementRequest,
    ) -> Result<ReinforcementOutcome, AppError> {
        req.validate()?;
        let original = self.load_original(actor, original_id).await?;

        let submission = self
            .submissions
            .find_by_assignment(&original.id)
            .await?
            .ok_or_else(|| {
                AppError::validation(
                    "Assignment has no submission; there is no basis for reinforcement",
                )
            })?;
        AssignmentService::ensure_linkable(&original)?;

        let activity = self.original_activity(&original).await?;
        let selection = select_questions(
            &activity.questions,
            &submission.answers,
            req.topics.as_deref(),
            req.question_count,
        )?;

        let (questions, topics) = match selection {
            Selection::NotNeeded => {
                tracing::info!(
                    assignment_id = %original.id,
                    "All answers correct; reinforcement not needed"
                );
                return Ok(ReinforcementOutcome::NotNeeded {
                    original_assignment_id: original.id,
                });
            }
            Selection::Selected { questions, topics } => (questions, topics),
        };

        let description = truncate_chars(
            &format!("{}{}", DESCRIPTION_PREFIX, activity.description),
            DESCRIPTION_MAX_CHARS,
        );
        let derived = self
            .create_derived_activity(actor, &activity, description, questions)
            .await?;

        let reason = ReinforcementReason {
            percent: submission.percent,
            threshold: submission.threshold,
            topics_to_improve: topics.clone(),
        };
        let assignment = self
            .assign_and_link(actor, &original, &derived, req.due_at, Some(reason))
            .await?;
        metrics::record_reinforcement("auto");

        Ok(ReinforcementOutcome::Created {
            original_assignment_id: original.id,
            student_id: assignment.student_id.clone(),
            reinforcement: created(&assignment, &derived, Some(topics)),
        })
    }

    /// Stores a teacher-written reinforcement activity without assigning it.
    pub async fn author_manual_activity(
        &self,
        actor: &Actor,
        original_id: &str,
        req: CreateReinforcementActivityRequest,
    ) -> Result<ReinforcementActivityResponse, AppError> {
        req.validate()?;
        let original = self.load_original(actor, original_id).await?;
        let derived = self
            .author(actor, &original, &req.description, req.questions)
            .await?;

        Ok(ReinforcementActivityResponse {
            activity_id: derived.id.clone(),
            description: derived.description.clone(),
            question_count: derived.questions.len(),
            origin_activity_id: original.activity_id,
            created_at: derived.created_at,
        })
    }

    /// Assigns a previously authored reinforcement activity.
    pub async fn assign_manual_activity(
        &self,
        actor: &Actor,
        original_id: &str,
        req: AssignReinforcementActivityRequest,
    ) -> Result<ReinforcementOutcome, AppError> {
        req.validate()?;
        let original = self.load_original(actor, original_id).await?;
        AssignmentService::ensure_linkable(&original)?;

        let derived = self
            .activities
            .get_by_id(&req.activity_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reinforcement activity not found"))?;

        if !derived.is_reinforcement {
            return Err(AppError::validation(
                "Activity is not a reinforcement activity",
            ));
        }
        if derived.created_by_teacher_id.as_deref() != Some(actor.user_id.as_str()) {
            tracing::warn!(
                activity_id = %derived.id,
                user_id = %actor.user_id,
                "Teacher tried to assign another teacher's reinforcement"
            );
            return Err(AppError::forbidden(
                "Reinforcement activity was created by another teacher",
            ));
        }
        if derived.origin_activity_id.as_deref() != Some(original.activity_id.as_str()) {
            return Err(AppError::validation(
                "Reinforcement activity does not correspond to this assignment's activity",
            ));
        }

        let assignment = self
            .assign_and_link(actor, &original, &derived, req.due_at, None)
            .await?;
        metrics::record_reinforcement("manual");

        Ok(ReinforcementOutcome::Created {
            original_assignment_id: original.id,
            student_id: assignment.student_id.clone(),
            reinforcement: created(&assignment, &derived, None),
        })
    }

    /// Authors and assigns a manual reinforcement in one step.
    pub async fn create_manual(
        &self,
        actor: &Actor,
        original_id: &str,
        req: ManualReinforcementRequest,
    ) -> Result<ReinforcementOutcome, AppError> {
        req.validate()?;
        let original = self.load_original(actor, original_id).await?;
        AssignmentService::ensure_linkable(&original)?;

        let derived = self
            .author(actor, &original, &req.description, req.questions)
            .await?;
        let assignment = self
            .assign_and_link(actor, &original, &derived, req.due_at, None)
            .await?;
        metrics::record_reinforcement("manual");

        Ok(ReinforcementOutcome::Created {
            original_assignment_id: original.id,
            student_id: assignment.student_id.clone(),
            reinforcement: created(&assignment, &derived, None),
        })
    }

    /// Checks shared by every mode: exists, owned, not a reinforcement.
    async fn load_original(&self, actor: &Actor, id: &str) -> Result<Assignment, AppError> {
        let original = self.lifecycle.get_for_teacher(actor, id).await?;
        AssignmentService::ensure_reinforceable(&original)?;
        Ok(original)
    }

    async fn original_activity(&self, original: &Assignment) -> Result<Activity, AppError> {
        self.activities
            .get_by_id(&original.activity_id)
            .await?
            .ok_or_else(|| AppError::not_found("Original activity not found"))
    }

    async fn author(
        &self,
        actor: &Actor,
        original: &Assignment,
        description: &str,
        questions: Vec<Question>,
    ) -> Result<Activity, AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::validation("Description is required"));
        }
        let activity = self.original_activity(original).await?;
        self.create_derived_activity(
            actor,
            &activity,
            truncate_chars(description, DESCRIPTION_MAX_CHARS),
            questions,
        )
        .await
    }

    async fn create_derived_activity(
        &self,
        actor: &Actor,
        origin: &Activity,
        description: String,
        questions: Vec<Question>,
    ) -> Result<Activity, AppError> {
        let derived = Activity {
            id: new_id(),
            description,
            questions,
            pass_threshold: origin.pass_threshold,
            is_reinforcement: true,
            origin_activity_id: Some(origin.id.clone()),
            created_by_teacher_id: Some(actor.user_id.clone()),
            created_at: Utc::now(),
        };
        let derived = self.activities.create(derived).await?;

        tracing::info!(
            activity_id = %derived.id,
            origin_activity_id = %origin.id,
            questions = derived.questions.len(),
            "Reinforcement activity created"
        );
        Ok(derived)
    }

    async fn assign_and_link(
        &self,
        actor: &Actor,
        original: &Assignment,
        activity: &Activity,
        due_at: Option<DateTime<Utc>>,
        reason: Option<ReinforcementReason>,
    ) -> Result<Assignment, AppError> {
        let assignment = self
            .lifecycle
            .create_reinforcement_assignment(actor, original, &activity.id, due_at, reason)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    activity_id = %activity.id,
                    original_assignment_id = %original.id,
                    "Reinforcement activity left unassigned: {}",
                    e
                );
            })?;

        self.lifecycle
            .link_reinforcement(&original.id, &assignment.id)
            .await?;
        Ok(assignment)
    }
}

fn created(
    assignment: &Assignment,
    activity: &Activity,
    topics: Option<Vec<String>>,
) -> CreatedReinforcement {
    CreatedReinforcement {
        assignment_id: assignment.id.clone(),
        activity_id: activity.id.clone(),
        description: activity.description.clone(),
        question_count: activity.questions.len(),
        topics,
        status: assignment.status,
        due_at: assignment.due_at,
    }
}
