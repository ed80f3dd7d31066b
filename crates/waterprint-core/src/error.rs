//! Core error types for waterprint-core.
//!
//! Every engine reports local validation failures synchronously through
//! [`CoreError`]. The validation variants carry the specific rule that was
//! violated so callers can surface it as rejected input.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::catalog::CategoryId;

/// Core error type for waterprint-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A survey answer was rejected.
    #[error("Invalid answer: {0}")]
    InvalidAnswer(#[from] AnswerError),

    /// A daily action or challenge definition was rejected.
    #[error("Invalid action: {0}")]
    InvalidAction(#[from] ActionError),

    /// Category is not registered in the catalog.
    #[error("Unknown category: {category}")]
    UnknownCategory { category: CategoryId },

    /// Ledger operation on a profile that does not exist yet.
    #[error("Unknown profile: no waterprint profile has been created")]
    UnknownProfile,

    /// Reporting window too long to bucket.
    #[error("Invalid window: {days} days exceeds the limit of {max}")]
    InvalidWindow { days: u32, max: u32 },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Survey answer rules.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnswerError {
    #[error("answer sequence is empty")]
    EmptySubmission,

    #[error("question {question_id} does not exist")]
    UnknownQuestion { question_id: u32 },

    #[error("option '{option}' is not one of the options of question {question_id}")]
    OptionNotInQuestion { question_id: u32, option: String },

    #[error("option index {index} out of range for question {question_id} ({len} options)")]
    OptionIndexOutOfRange {
        question_id: u32,
        index: usize,
        len: usize,
    },
}

/// Daily action and challenge definition rules.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// Days must be logged strictly in sequence: no gaps, no re-submission.
    #[error("day {day} is out of sequence: expected day {expected}")]
    DayOutOfSequence { day: u32, expected: u32 },

    #[error("day {day} exceeds the challenge duration of {duration} days")]
    DayBeyondDuration { day: u32, duration: u32 },

    #[error("saved amount {saved} is negative")]
    SavedBelowZero { saved: f64 },

    #[error("saved amount {saved} exceeds the daily cap of {cap} for {category}")]
    SavedAboveCap {
        saved: f64,
        cap: f64,
        category: CategoryId,
    },

    #[error("date {date} is outside the challenge window {start}..={end}")]
    DateOutsideWindow {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("challenge for {category} is {state} and no longer accepts actions")]
    ChallengeClosed { category: CategoryId, state: String },

    #[error("a challenge for {category} is already active")]
    ChallengeAlreadyActive { category: CategoryId },

    #[error("no challenge exists for {category}")]
    NoChallenge { category: CategoryId },

    #[error("target saving must be positive, got {target}")]
    NonPositiveTarget { target: f64 },

    #[error("challenge duration must be at least one day")]
    ZeroDuration,

    #[error("challenge duration of {duration} days exceeds the limit of {max}")]
    DurationOutOfRange { duration: u32, max: u32 },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
