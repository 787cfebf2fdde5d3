use thiserror::Error;

/// Main error type for DMRest
#[derive(Error, Debug)]
pub enum DmrestError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No topic with the requested id
    #[error("topic {0} not found")]
    TopicNotFound(i64),

    /// No topic type with the requested uri
    #[error("type {0} not found")]
    TypeNotFound(String),

    /// A stored record that cannot be mapped onto the topic model
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DmrestError {
    /// True for the errors a client sees as 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, DmrestError::TopicNotFound(_) | DmrestError::TypeNotFound(_))
    }
}

/// Convenient Result type using DmrestError
pub type Result<T> = std::result::Result<T, DmrestError>;
