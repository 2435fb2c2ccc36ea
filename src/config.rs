//! Runtime configuration read from the environment (and `.env`, loaded in main).
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "db.sqlite3";
/// Single local user until authentication exists.
pub const DEFAULT_USER_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const DEFAULT_MODEL: &str = "gpt4";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub user_id: String,
    pub model: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            user_id: DEFAULT_USER_ID.to_string(),
            model: DEFAULT_MODEL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            db_path: get("FLASHCARDS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            user_id: get("FLASHCARDS_USER_ID").unwrap_or(defaults.user_id),
            model: get("FLASHCARDS_MODEL").unwrap_or(defaults.model),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }
}
