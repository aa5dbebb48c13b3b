//! Countries Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, configuration, logging, and error handling for the countries
//! ETL pipeline and table viewer.
//!
//! # Overview
//!
//! - **Error Handling**: `CountriesError` and the `Result` alias
//! - **Configuration**: database settings read from `DB_*` environment variables
//! - **Logging**: `tracing` subscriber bootstrap shared by every binary
//! - **Types**: raw API records and the flat `CountryRow`
//!
//! # Example
//!
//! ```no_run
//! use countries_common::config::DbSettings;
//!
//! fn connect_url() -> countries_common::Result<String> {
//!     let settings = DbSettings::from_env()?;
//!     Ok(settings.connection_url())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CountriesError, Result};
pub use types::{CountryRow, RawCountryRecord};
