use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use serde::Deserialize;

use super::{
    ActivityCatalog, AssignmentRepository, IdentityProvider, StoreError, SubmissionRepository,
};
use crate::{
    metrics::track_db_operation,
    models::{
        activity::Activity,
        assignment::{Assignment, AssignmentFilter, AssignmentStatus},
        submission::Submission,
        user::{UserRecord, UserRole},
    },
};

const ACTIVITIES: &str = "activities";
const ASSIGNMENTS: &str = "assignments";
const SUBMISSIONS: &str = "submissions";
const USERS: &str = "users";

const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY_CODE
    )
}

fn map_insert_error(err: MongoError, duplicate_message: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate(duplicate_message.to_string())
    } else {
        StoreError::Database(err)
    }
}

/// Creates the unique indexes the workflow relies on for idempotency.
pub async fn ensure_indexes(db: &Database) -> anyhow::Result<()> {
    let assignments = db.collection::<Document>(ASSIGNMENTS);
    assignments
        .create_index(
            IndexModel::builder()
                .keys(doc! { "teacherId": 1, "activityId": 1, "studentId": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "isReinforcement": false })
                        .build(),
                )
                .build(),
        )
        .await?;
    assignments
        .create_index(
            IndexModel::builder()
                .keys(doc! { "originalAssignmentId": 1 })
                .build(),
        )
        .await?;
    assignments
        .create_index(IndexModel::builder().keys(doc! { "studentId": 1 }).build())
        .await?;

    let submissions = db.collection::<Document>(SUBMISSIONS);
    submissions
        .create_index(
            IndexModel::builder()
                .keys(doc! { "assignmentId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;
    submissions
        .create_index(
            IndexModel::builder()
                .keys(doc! { "teacherId": 1, "needsReinforcement": 1 })
                .build(),
        )
        .await?;

    tracing::info!("MongoDB indexes ensured");
    Ok(())
}

pub struct MongoActivityCatalog {
    collection: Collection<Activity>,
}

impl MongoActivityCatalog {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(ACTIVITIES),
        }
    }
}

#[async_trait]
impl ActivityCatalog for MongoActivityCatalog {
    async fn create(&self, activity: Activity) -> Result<Activity, StoreError> {
        track_db_operation("insert_one", ACTIVITIES, async {
            self.collection
                .insert_one(&activity)
                .await
                .map_err(|e| map_insert_error(e, "Activity already exists"))
        })
        .await?;
        Ok(activity)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Activity>, StoreError> {
        track_db_operation("find_one", ACTIVITIES, async {
            Ok::<_, StoreError>(self.collection.find_one(doc! { "_id": id }).await?)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    role: String,
}

/// Reads users maintained by the administration service.
pub struct MongoDirectory {
    collection: Collection<UserDocument>,
}

impl MongoDirectory {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(USERS),
        }
    }
}

#[async_trait]
impl IdentityProvider for MongoDirectory {
    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let user = track_db_operation("find_one", USERS, async {
            Ok::<_, StoreError>(self.collection.find_one(doc! { "_id": object_id }).await?)
        })
        .await?;

        user.map(|doc| {
            let role = UserRole::parse(&doc.role).ok_or_else(|| {
                StoreError::Corrupt(format!("User {} has unknown role {}", doc.id, doc.role))
            })?;
            Ok(UserRecord {
                id: doc.id.to_hex(),
                name: doc.name,
                email: doc.email,
                role,
            })
        })
        .transpose()
    }
}

pub struct MongoAssignmentRepository {
    collection: Collection<Assignment>,
}

impl MongoAssignmentRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(ASSIGNMENTS),
        }
    }

    fn filter_document(filter: &AssignmentFilter) -> Document {
        let mut query = doc! {};
        if let Some(teacher_id) = &filter.teacher_id {
            query.insert("teacherId", teacher_id.as_str());
        }
        if let Some(student_id) = &filter.student_id {
            query.insert("studentId", student_id.as_str());
        }
        if let Some(activity_id) = &filter.activity_id {
            query.insert("activityId", activity_id.as_str());
        }
        if let Some(status) = filter.status {
            query.insert("status", status.as_str());
        }
        if let Some(flag) = filter.is_reinforcement {
            query.insert("isReinforcement", flag);
        }
        if let Some(original_id) = &filter.original_assignment_id {
            query.insert("originalAssignmentId", original_id.as_str());
        }
        query
    }
}

#[async_trait]
impl AssignmentRepository for MongoAssignmentRepository {
    async fn insert(&self, assignment: &Assignment) -> Result<(), StoreError> {
        track_db_operation("insert_one", ASSIGNMENTS, async {
            self.collection
                .insert_one(assignment)
                .await
                .map(|_| ())
                .map_err(|e| {
                    map_insert_error(
                        e,
                        "Duplicate assignment for this teacher, activity and student",
                    )
                })
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Assignment>, StoreError> {
        track_db_operation("find_one", ASSIGNMENTS, async {
            Ok::<_, StoreError>(self.collection.find_one(doc! { "_id": id }).await?)
        })
        .await
    }

    async fn find(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, StoreError> {
        let query = Self::filter_document(filter);
        track_db_operation("find", ASSIGNMENTS, async {
            let cursor = self.collection.find(query).sort(doc! { "_id": -1 }).await?;
            Ok::<_, StoreError>(cursor.try_collect::<Vec<_>>().await?)
        })
        .await
    }

    async fn transition(
        &self,
        id: &str,
        from: &[AssignmentStatus],
        to: AssignmentStatus,
        submission_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let allowed: Vec<&str> = from.iter().map(AssignmentStatus::as_str).collect();
        let mut set = doc! { "status": to.as_str() };
        if let Some(submission_id) = submission_id {
            set.insert("submissionId", submission_id);
        }

        let result = track_db_operation("update_one", ASSIGNMENTS, async {
            Ok::<_, StoreError>(
                self.collection
                    .update_one(
                        doc! { "_id": id, "status": { "$in": allowed } },
                        doc! { "$set": set },
                    )
                    .await?,
            )
        })
        .await?;

        Ok(result.matched_count > 0)
    }
}

pub struct MongoSubmissionRepository {
    collection: Collection<Submission>,
}

impl MongoSubmissionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(SUBMISSIONS),
        }
    }
}

#[async_trait]
impl SubmissionRepository for MongoSubmissionRepository {
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError> {
        track_db_operation("insert_one", SUBMISSIONS, async {
            self.collection
                .insert_one(submission)
                .await
                .map(|_| ())
                .map_err(|e| map_insert_error(e, "This assignment has already been submitted"))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        track_db_operation("delete_one", SUBMISSIONS, async {
            self.collection.delete_one(doc! { "_id": id }).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn find_by_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Option<Submission>, StoreError> {
        track_db_operation("find_one", SUBMISSIONS, async {
            Ok::<_, StoreError>(self
                .collection
                .find_one(doc! { "assignmentId": assignment_id })
                .await?)
        })
        .await
    }

    async fn find_by_teacher(
        &self,
        teacher_id: &str,
        needs_reinforcement: Option<bool>,
    ) -> Result<Vec<Submission>, StoreError> {
        let mut query = doc! { "teacherId": teacher_id };
        if let Some(flag) = needs_reinforcement {
            query.insert("needsReinforcement", flag);
        }

        track_db_operation("find", SUBMISSIONS, async {
            let cursor = self.collection.find(query).sort(doc! { "_id": -1 }).await?;
            Ok::<_, StoreError>(cursor.try_collect::<Vec<_>>().await?)
        })
        .await
    }
}
