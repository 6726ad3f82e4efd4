//! Error types shared by the scheduler core and the desktop host.

use thiserror::Error;

/// Errors raised by the scheduling core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// The raw grade is outside the recognized 0-5 domain. Nothing was mutated.
    #[error("Invalid grade: {0}")]
    InvalidGrade(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    InvalidGrade(#[from] SchedulerError),

    #[error("Invalid export document: {0}")]
    InvalidExport(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
