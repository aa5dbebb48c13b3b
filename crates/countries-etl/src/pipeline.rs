//! One full extract-transform-load run
//!
//! Steps run strictly in sequence: load-or-fetch the raw records, project
//! them, pivot to a frame, connect, write. The first failure ends the run;
//! nothing is retried and nothing is partially written.

use crate::db;
use crate::error::{EtlError, Result};
use crate::fetcher::{
    endpoint_url, RawFetcher, RecordSource, DEFAULT_API_URL, DEFAULT_CACHE_FILE,
    DEFAULT_HTTP_TIMEOUT_SECS, FIELDS_OF_INTEREST,
};
use crate::frame::CountryFrame;
use crate::loader::{LoadStrategy, Loader, TableRef};
use crate::projector::project;
use countries_common::config::DbSettings;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base endpoint; the field list is appended
    pub api_url: String,
    pub cache_file: PathBuf,
    pub target: TableRef,
    pub strategy: LoadStrategy,
    pub http_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            target: TableRef::default(),
            strategy: LoadStrategy::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl PipelineConfig {
    /// Full request URL including `?fields=...`
    pub fn request_url(&self) -> String {
        endpoint_url(&self.api_url, &FIELDS_OF_INTEREST)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub source: RecordSource,
    pub fetched: usize,
    pub loaded: usize,
}

/// Run the pipeline against a fresh pool built from `db_settings`
#[tracing::instrument(skip_all, fields(table = %config.target, strategy = %config.strategy))]
pub async fn run(config: &PipelineConfig, db_settings: &DbSettings) -> Result<PipelineReport> {
    // Fail on an unsupported strategy before touching the network or the cache.
    if config.strategy == LoadStrategy::UpsertByKey {
        return Err(EtlError::UnsupportedStrategy(config.strategy));
    }

    let fetcher = RawFetcher::new(config.http_timeout)?;
    let (records, source) = fetcher
        .load_or_fetch(&config.request_url(), &config.cache_file)
        .await?;

    let rows = project(&records)?;
    let frame = CountryFrame::from_rows(&rows);
    info!(rows = frame.len(), %source, "Transformed raw records");

    let pool = db::connect_pool(db_settings).await.map_err(|source| {
        error!(error = %source, url = %db_settings.redacted_url(), "Could not connect to the database");
        EtlError::Persistence {
            rows: frame.len(),
            table: config.target.to_string(),
            source,
        }
    })?;

    let report = Loader::new(pool.clone())
        .load_frame(&frame, &config.target, config.strategy)
        .await;
    pool.close().await;
    let report = report?;

    info!(
        fetched = records.len(),
        loaded = report.rows,
        table = %report.table,
        %source,
        "Pipeline finished"
    );

    Ok(PipelineReport {
        source,
        fetched: records.len(),
        loaded: report.rows,
    })
}

/// Load-or-fetch and project without touching the database
pub async fn extract_and_transform(config: &PipelineConfig) -> Result<(CountryFrame, RecordSource)> {
    let fetcher = RawFetcher::new(config.http_timeout)?;
    let (records, source) = fetcher
        .load_or_fetch(&config.request_url(), &config.cache_file)
        .await?;

    let rows = project(&records)?;
    Ok((CountryFrame::from_rows(&rows), source))
}
