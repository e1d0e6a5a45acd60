//! Error types surfaced to callers.
//!
//! Only configuration and storage failures propagate. Unreadable row values
//! are reported per field (`fields::Field::Malformed`) and layout no-ops are
//! reported as `layout::LayoutOutcome` values.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Invalid alert window: short term ({short_term_days}d) must be positive and shorter than long term ({long_term_days}d)"
    )]
    InvalidAlertWindow {
        short_term_days: u32,
        long_term_days: u32,
    },

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConfigError {
    /// True when the caller submitted a value that was rejected as-is.
    pub fn is_validation(&self) -> bool {
        matches!(self, ConfigError::InvalidAlertWindow { .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Layout update for {user_id}/{context_id} was not applied")]
    UpdateNotApplied { user_id: String, context_id: String },
}
