//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;
use std::path::PathBuf;

const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const DB_FILE_NAME: &str = "screenvault.db";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file backing the local store
    pub db_path: PathBuf,
    /// Firebase project ID (Firestore project and ID token audience)
    pub firebase_project_id: String,
    /// Firebase web API key (Identity Toolkit)
    pub firebase_api_key: String,
    /// Firebase Storage bucket for profile photos
    pub storage_bucket: String,
    /// TMDB v3 API key
    pub tmdb_api_key: String,
    /// TMDB API base URL
    pub tmdb_base_url: String,
    /// Use the in-memory remote profile service instead of Firebase
    pub offline: bool,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            db_path: PathBuf::from(":memory:"),
            firebase_project_id: "test-project".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            tmdb_api_key: "test_tmdb_key".to_string(),
            tmdb_base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            offline: true,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

        let db_path = match env::var("SCREENVAULT_DB_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_db_path()?,
        };

        Ok(Self {
            db_path,
            storage_bucket: env::var("FIREBASE_STORAGE_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", firebase_project_id)),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            tmdb_api_key: env::var("TMDB_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("TMDB_API_KEY"))?,
            tmdb_base_url: env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_TMDB_BASE_URL.to_string()),
            offline: env::var("SCREENVAULT_OFFLINE")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            firebase_project_id,
        })
    }
}

/// Default database location inside the platform data directory.
fn default_db_path() -> Result<PathBuf, ConfigError> {
    let data_dir = directories::ProjectDirs::from("com", "screenvault", "screenvault")
        .ok_or(ConfigError::NoDataDir)?
        .data_dir()
        .to_path_buf();

    std::fs::create_dir_all(&data_dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;

    Ok(data_dir.join(DB_FILE_NAME))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to create data directory: {0}")]
    DataDir(String),
}
