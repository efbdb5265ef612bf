use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        activity::{clamp_pass_threshold, Activity, ActivityView, CreateActivityRequest},
        user::Actor,
    },
    repositories::ActivityCatalog,
    services::AppState,
    utils::ids::new_id,
};

/// Thin teacher-facing surface over the activity catalog.
pub struct ActivityService {
    activities: Arc<dyn ActivityCatalog>,
}

impl ActivityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            activities: state.activities.clone(),
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        req: CreateActivityRequest,
    ) -> Result<ActivityView, AppError> {
        actor.require_teacher()?;
        req.validate()?;

        let description = req.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::validation("Description is required"));
        }

        let activity = Activity {
            id: new_id(),
            description,
            questions: req.questions,
            pass_threshold: clamp_pass_threshold(req.pass_threshold),
            is_reinforcement: false,
            origin_activity_id: None,
            created_by_teacher_id: Some(actor.user_id.clone()),
            created_at: Utc::now(),
        };

        let activity = self.activities.create(activity).await?;
        tracing::info!(
            activity_id = %activity.id,
            questions = activity.questions.len(),
            "Activity created"
        );
        Ok(activity.into())
    }

    pub async fn get(&self, actor: &Actor, id: &str) -> Result<ActivityView, AppError> {
        actor.require_teacher()?;
        self.activities
            .get_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::not_found("Activity not found"))
    }
}
