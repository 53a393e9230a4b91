//! Common error types for idlk

use thiserror::Error;

/// Common result type for idlk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across idlk services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Neither an email nor a phone number was supplied
    #[error("Either email or phoneNumber is required")]
    NoIdentifyingField,

    /// Transaction conflict that persisted through every retry attempt
    #[error("Transient conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::NoIdentifyingField)
    }
}
