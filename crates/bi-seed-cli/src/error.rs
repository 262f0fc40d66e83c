//! Error types for bi-seed
//!
//! Messages are written for the operator watching a bootstrap run, so each
//! one says what was being attempted.

use thiserror::Error;

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, SeedError>;

#[derive(Error, Debug)]
pub enum SeedError {
    /// The API answered with a status the caller did not accept
    #[error("API returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A 200 response was missing a field the handshake needs
    #[error("API response is missing '{0}'")]
    MissingField(&'static str),

    /// Connection refused, timeout, TLS failure and friends
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Database driver error raised during a reachability check
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// SQL Server (TDS) error raised during a reachability check
    #[error("SQL Server error: {0}")]
    SqlServer(#[from] tiberius::error::Error),

    /// Connection spec does not follow `Name:UUID:URI`
    #[error("Invalid connection spec '{0}'. Expected format: 'Name:UUID:ConnectionURI'")]
    InvalidConnectionSpec(String),

    /// Reachability check for a single database failed
    #[error("Database '{database}' is not reachable: {reason}")]
    Unreachable { database: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// The login endpoint never answered
    #[error("API at {base_url} not available after {attempts} attempt(s)")]
    ApiUnavailable { base_url: String, attempts: u32 },

    #[error("Failed to authenticate after {attempts} attempt(s): {last}")]
    AuthenticationFailed { attempts: u32, last: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeedError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unreachable(database: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unreachable {
            database: database.into(),
            reason: reason.into(),
        }
    }

    /// Fatal errors abort the run before any registration or import happens
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SeedError::ApiUnavailable { .. }
                | SeedError::AuthenticationFailed { .. }
                | SeedError::Config(_)
        )
    }
}
