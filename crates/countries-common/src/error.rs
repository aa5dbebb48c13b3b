//! Error types shared by the countries crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CountriesError>;

/// Main error type for shared functionality
#[derive(Error, Debug)]
pub enum CountriesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Every required variable that was unset or empty, in lookup order
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnvironment(Vec<String>),

    #[error("Invalid value for environment variable {key}: {reason}")]
    InvalidEnvironment { key: String, reason: String },
}
