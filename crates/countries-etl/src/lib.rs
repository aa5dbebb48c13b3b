//! Countries ETL
//!
//! Fetches the country list from the REST Countries API (or a local cache
//! file), projects each record onto a flat [`CountryRow`](countries_common::CountryRow),
//! and replaces the contents of a PostgreSQL table with the result.
//!
//! The [`readiness`] module provides the gate that dependent processes use to
//! block until that table has rows.

pub mod db;
pub mod error;
pub mod fetcher;
pub mod frame;
pub mod loader;
pub mod pipeline;
pub mod projector;
pub mod readiness;

pub use error::{EtlError, Result};
pub use fetcher::{RawFetcher, RecordSource};
pub use frame::CountryFrame;
pub use loader::{LoadReport, LoadStrategy, Loader, TableRef};
pub use pipeline::{PipelineConfig, PipelineReport};
pub use readiness::{GateError, GateReport, PgRowCountProbe, ReadinessGate, RetryPolicy};
