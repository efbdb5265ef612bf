use std::sync::Arc;

use mongodb::{Client as MongoClient, Database};

use crate::config::Config;
use crate::repositories::{
    memory::{
        InMemoryActivityCatalog, InMemoryAssignmentRepository, InMemoryDirectory,
        InMemorySubmissionRepository,
    },
    mongo::{
        ensure_indexes, MongoActivityCatalog, MongoAssignmentRepository, MongoDirectory,
        MongoSubmissionRepository,
    },
    ActivityCatalog, AssignmentRepository, IdentityProvider, SubmissionRepository,
};

pub struct AppState {
    pub config: Config,
    /// Present only with the MongoDB backend.
    pub mongo: Option<Database>,
    pub activities: Arc<dyn ActivityCatalog>,
    pub identity: Arc<dyn IdentityProvider>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        tracing::info!("Ensuring MongoDB indexes on {}", config.mongo_database);
        ensure_indexes(&mongo).await?;

        Ok(Self {
            activities: Arc::new(MongoActivityCatalog::new(&mongo)),
            identity: Arc::new(MongoDirectory::new(&mongo)),
            assignments: Arc::new(MongoAssignmentRepository::new(&mongo)),
            submissions: Arc::new(MongoSubmissionRepository::new(&mongo)),
            mongo: Some(mongo),
            config,
        })
    }

    /// State backed by in-memory stores; users come from `directory`.
    pub fn in_memory(config: Config, directory: Arc<InMemoryDirectory>) -> Self {
        Self::with_repositories(
            config,
            Arc::new(InMemoryActivityCatalog::new()),
            directory,
            Arc::new(InMemoryAssignmentRepository::new()),
            Arc::new(InMemorySubmissionRepository::new()),
        )
    }

    pub fn with_repositories(
        config: Config,
        activities: Arc<dyn ActivityCatalog>,
        identity: Arc<dyn IdentityProvider>,
        assignments: Arc<dyn AssignmentRepository>,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            config,
            mongo: None,
            activities,
            identity,
            assignments,
            submissions,
        }
    }
}

pub mod activity_service;
pub mod assignment_service;
pub mod grading;
pub mod lookup;
pub mod reinforcement_service;
pub mod reporting_service;
pub mod submission_service;
pub mod topic_report;
