//! Core error types for prayermute-core.
//!
//! Every external call (provider, store, audio device, wake timer, job queue)
//! is classified into one of these enums before it crosses back into the
//! scheduling code. Nothing here is fatal: the coordinator degrades or
//! schedules a retry instead of aborting.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for prayermute-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Time table fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Audio device errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Wake timer / job queue errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while obtaining a time table from the provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or timeout talking to the provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success HTTP status
    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    /// Provider answered but returned no day record
    #[error("provider returned no prayer times for today")]
    EmptyResult,

    /// Provider answered with a record the core cannot use
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend failed to read or write
    #[error("store backend failed: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded
    #[error("cannot encode value for '{key}': {message}")]
    Encoding { key: String, message: String },

    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// SQLite query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Audio device errors.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The device refused a ringer mode change (e.g. missing DND access)
    #[error("cannot change ringer mode: {0}")]
    RingerMode(String),

    /// The device refused a stream volume change
    #[error("cannot set {stream} volume: {message}")]
    Volume { stream: String, message: String },

    /// The device could not be queried
    #[error("audio device unavailable: {0}")]
    Unavailable(String),
}

/// Wake timer and deferred job queue errors.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The host refused to register a precise wake timer
    #[error("cannot set wake timer for slot {slot}: {message}")]
    Timer { slot: u8, message: String },

    /// The host refused to enqueue a deferred job
    #[error("cannot enqueue job '{name}': {message}")]
    Job { name: String, message: String },

    /// The store backing a host primitive failed
    #[error(transparent)]
    Store(#[from] StoreError),
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("cannot access data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A prayer time is not a valid "HH:MM" value
    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),

    /// A date is not a valid "YYYY-MM-DD" value
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Unknown prayer name
    #[error("unknown prayer '{0}'")]
    UnknownPrayer(String),

    /// Unknown mute mode
    #[error("unknown mute mode '{0}', expected silent or vibrate")]
    UnknownMuteMode(String),

    /// Unknown ringer mode
    #[error("unknown ringer mode '{0}', expected normal, vibrate or silent")]
    UnknownRingerMode(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
