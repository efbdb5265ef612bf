use serde::Deserialize;
use std::env;

use crate::models::user::UserRecord;

/// Where assignments, submissions and activities are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            "memory" | "in-memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Mongo => "mongo",
            StorageBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app_env: String,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    /// `user:password` accepted by the /metrics endpoint.
    pub metrics_auth: String,
    /// Directory served by the in-memory backend (`[[memory.users]]`).
    pub memory_users: Vec<UserRecord>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "classroom".to_string());

        let jwt_secret = match settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
        {
            Ok(secret) => secret,
            Err(_) if app_env == "prod" => {
                return Err(config::ConfigError::Message(
                    "JWT_SECRET must be set in production".to_string(),
                ));
            }
            Err(_) => {
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            }
        };

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let storage_backend = match settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STORAGE_BACKEND"))
        {
            Ok(raw) => StorageBackend::parse(&raw).ok_or_else(|| {
                config::ConfigError::Message(format!("Unknown storage backend: {}", raw))
            })?,
            Err(_) => StorageBackend::Mongo,
        };

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or_else(|_| "admin:changeme".to_string());

        let memory_users = read_memory_users(&settings)?;

        Ok(Config {
            app_env,
            mongo_uri,
            mongo_database,
            jwt_secret,
            bind_addr,
            storage_backend,
            metrics_auth,
            memory_users,
        })
    }

    /// Settings for tests and local runs without any external services.
    pub fn for_memory(jwt_secret: &str) -> Self {
        Config {
            app_env: "test".to_string(),
            mongo_uri: String::new(),
            mongo_database: "classroom".to_string(),
            jwt_secret: jwt_secret.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            storage_backend: StorageBackend::Memory,
            metrics_auth: "admin:changeme".to_string(),
            memory_users: Vec::new(),
        }
    }
}

fn read_memory_users(
    settings: &config::Config,
) -> Result<Vec<UserRecord>, config::ConfigError> {
    match settings.get::<Vec<UserRecord>>("memory.users") {
        Ok(users) => Ok(users),
        Err(config::ConfigError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}
