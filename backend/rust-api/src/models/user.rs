use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Roles as issued in JWT claims and stored in the "users" collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<UserRole> {
        match value {
            "student" => Some(UserRole::Student),
            "teacher" => Some(UserRole::Teacher),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Identity record resolved through the identity provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Public user fields embedded in teacher reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl UserSummary {
    /// Placeholder for a referenced user that no longer resolves.
    pub fn unknown(id: &str) -> Self {
        UserSummary {
            id: id.to_string(),
            name: "—".to_string(),
            email: "—".to_string(),
        }
    }
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        UserSummary {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Actor {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn teacher(user_id: impl Into<String>) -> Self {
        Actor::new(user_id, UserRole::Teacher)
    }

    pub fn student(user_id: impl Into<String>) -> Self {
        Actor::new(user_id, UserRole::Student)
    }

    pub fn require_teacher(&self) -> Result<(), AppError> {
        match self.role {
            UserRole::Teacher | UserRole::Admin => Ok(()),
            UserRole::Student => Err(AppError::forbidden("Teacher role required")),
        }
    }

    pub fn require_student(&self) -> Result<(), AppError> {
        match self.role {
            UserRole::Student => Ok(()),
            _ => Err(AppError::forbidden("Student role required")),
        }
    }
}
