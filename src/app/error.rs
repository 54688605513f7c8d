use thiserror::Error;

use crate::config::ConfigError;

/// Network, transport or parse failure for one feed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Feed parsing error: {0}")]
    Parse(String),
}

/// Store failure for one feed. Never affects other feeds.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Feed not found: {0}")]
    FeedNotFound(String),
}

/// Failure of one feed's sync pipeline.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Sync cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum FeedwatchError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<FetchError> for FeedwatchError {
    fn from(err: FetchError) -> Self {
        Self::Sync(SyncError::Fetch(err))
    }
}

impl From<PersistenceError> for FeedwatchError {
    fn from(err: PersistenceError) -> Self {
        Self::Sync(SyncError::Persistence(err))
    }
}

pub type Result<T> = std::result::Result<T, FeedwatchError>;
