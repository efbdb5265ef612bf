use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::time::bson_datetime;

/// Maximum length (in characters) of an activity description.
pub const DESCRIPTION_MAX_CHARS: usize = 180;

/// Pass threshold applied when an activity does not configure one.
pub const DEFAULT_PASS_THRESHOLD: u32 = 70;

/// One of the five answer letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOption {
    A,
    B,
    C,
    D,
    E,
}

impl AnswerOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerOption::A => "A",
            AnswerOption::B => "B",
            AnswerOption::C => "C",
            AnswerOption::D => "D",
            AnswerOption::E => "E",
        }
    }
}

/// The five option texts of a question, keyed by letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OptionSet {
    #[serde(rename = "A")]
    #[validate(length(min = 1, max = 600, message = "Option A must be 1-600 characters"))]
    pub a: String,
    #[serde(rename = "B")]
    #[validate(length(min = 1, max = 600, message = "Option B must be 1-600 characters"))]
    pub b: String,
    #[serde(rename = "C")]
    #[validate(length(min = 1, max = 600, message = "Option C must be 1-600 characters"))]
    pub c: String,
    #[serde(rename = "D")]
    #[validate(length(min = 1, max = 600, message = "Option D must be 1-600 characters"))]
    pub d: String,
    #[serde(rename = "E")]
    #[validate(length(min = 1, max = 600, message = "Option E must be 1-600 characters"))]
    pub e: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[validate(length(min = 1, max = 2000, message = "Statement must be 1-2000 characters"))]
    pub statement: String,
    #[serde(default)]
    #[validate(length(max = 120, message = "Topic must be at most 120 characters"))]
    pub topic: String,
    #[validate(nested)]
    pub options: OptionSet,
    pub correct_option: AnswerOption,
}

/// Quiz definition stored in the "activities" collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "_id")]
    pub id: String,
    pub description: String,
    pub questions: Vec<Question>,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u32,
    #[serde(default)]
    pub is_reinforcement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_teacher_id: Option<String>,
    #[serde(with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
}

fn default_pass_threshold() -> u32 {
    DEFAULT_PASS_THRESHOLD
}

/// Clamps a configured threshold into `[0, 100]`, defaulting when unset.
pub fn clamp_pass_threshold(value: Option<i64>) -> u32 {
    match value {
        Some(v) => v.clamp(0, 100) as u32,
        None => DEFAULT_PASS_THRESHOLD,
    }
}

/// Teacher payload for a new catalog activity.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    #[validate(length(min = 1, max = 180, message = "Description must be 1-180 characters"))]
    pub description: String,
    #[validate(length(min = 1, message = "Questionnaire must have at least one question"), nested)]
    pub questions: Vec<Question>,
    pub pass_threshold: Option<i64>,
}

/// Full activity as shown to teachers (correct options included).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub pass_threshold: u32,
    pub is_reinforcement: bool,
    pub origin_activity_id: Option<String>,
    pub created_by_teacher_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Activity> for ActivityView {
    fn from(activity: Activity) -> Self {
        ActivityView {
            id: activity.id,
            description: activity.description,
            questions: activity.questions,
            pass_threshold: activity.pass_threshold,
            is_reinforcement: activity.is_reinforcement,
            origin_activity_id: activity.origin_activity_id,
            created_by_teacher_id: activity.created_by_teacher_id,
            created_at: activity.created_at,
        }
    }
}

/// Question without its correct option.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuestion {
    pub statement: String,
    pub topic: String,
    pub options: OptionSet,
}

/// Activity as shown to students: the answer key is stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentActivityView {
    pub id: String,
    pub description: String,
    pub questions: Vec<StudentQuestion>,
    pub created_at: DateTime<Utc>,
}

impl From<&Activity> for StudentActivityView {
    fn from(activity: &Activity) -> Self {
        StudentActivityView {
            id: activity.id.clone(),
            description: activity.description.clone(),
            questions: activity
                .questions
                .iter()
                .map(|q| StudentQuestion {
                    statement: q.statement.clone(),
                    topic: q.topic.clone(),
                    options: q.options.clone(),
                })
                .collect(),
            created_at: activity.created_at,
        }
    }
}
