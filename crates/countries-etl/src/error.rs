//! Error types for the extract-transform-load pipeline

use crate::loader::LoadStrategy;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Every way a pipeline run can fail
///
/// None of these are retried; a run either loads the whole batch or stops.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] countries_common::CountriesError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network error: {url} answered with HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed JSON from {origin}: {source}")]
    DataFormat {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Record {index} has invalid field '{field}': expected {expected}")]
    InvalidField {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("Failed to write {rows} rows to {table}: {source}")]
    Persistence {
        rows: usize,
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Load strategy '{0}' is not implemented")]
    UnsupportedStrategy(LoadStrategy),
}

impl EtlError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn data_format(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::DataFormat {
            origin: origin.into(),
            source,
        }
    }

    /// Transport failures and non-success HTTP answers
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::HttpStatus { .. })
    }
}
