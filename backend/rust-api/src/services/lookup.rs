use std::{collections::HashMap, sync::Arc};

use crate::{
    error::AppError,
    models::{activity::Activity, assignment::ActivityRef, user::UserSummary},
    repositories::{ActivityCatalog, IdentityProvider},
};

/// Per-request cache for the users and activities referenced by listings.
pub struct ReferenceCache {
    identity: Arc<dyn IdentityProvider>,
    catalog: Arc<dyn ActivityCatalog>,
    users: HashMap<String, Option<UserSummary>>,
    activities: HashMap<String, Option<Activity>>,
}

impl ReferenceCache {
    pub fn new(identity: Arc<dyn IdentityProvider>, catalog: Arc<dyn ActivityCatalog>) -> Self {
        Self {
            identity,
            catalog,
            users: HashMap::new(),
            activities: HashMap::new(),
        }
    }

    pub async fn user(&mut self, id: &str) -> Result<Option<UserSummary>, AppError> {
        if let Some(cached) = self.users.get(id) {
            return Ok(cached.clone());
        }
        let summary = self
            .identity
            .find_user(id)
            .await?
            .as_ref()
            .map(UserSummary::from);
        self.users.insert(id.to_string(), summary.clone());
        Ok(summary)
    }

    /// Like [`Self::user`], with a placeholder for users that no longer resolve.
    pub async fn user_or_unknown(&mut self, id: &str) -> Result<UserSummary, AppError> {
        Ok(self
            .user(id)
            .await?
            .unwrap_or_else(|| UserSummary::unknown(id)))
    }

    pub async fn activity(&mut self, id: &str) -> Result<Option<Activity>, AppError> {
        if let Some(cached) = self.activities.get(id) {
            return Ok(cached.clone());
        }
        let activity = self.catalog.get_by_id(id).await?;
        self.activities.insert(id.to_string(), activity.clone());
        Ok(activity)
    }

    pub async fn activity_ref(&mut self, id: &str) -> Result<ActivityRef, AppError> {
        let description = self
            .activity(id)
            .await?
            .map(|a| a.description)
            .unwrap_or_else(|| "—".to_string());
        Ok(ActivityRef {
            id: id.to_string(),
            description,
        })
    }
}
