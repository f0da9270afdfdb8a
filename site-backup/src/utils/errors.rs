//! Custom error types for site-backup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FTP error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sqlexport endpoint answered 404. Fatal for the whole run.
    #[error("Couldn't find {0}")]
    EndpointNotFound(String),

    /// A directory listing line that could not be tokenized.
    #[error("Malformed listing line in {directory}: {line:?}")]
    MalformedListing { directory: String, line: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Task error: {0}")]
    Task(String),
}

impl From<config::ConfigError> for BackupError {
    fn from(e: config::ConfigError) -> Self {
        BackupError::Config(e.to_string())
    }
}

impl From<tokio::task::JoinError> for BackupError {
    fn from(e: tokio::task::JoinError) -> Self {
        BackupError::Task(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
