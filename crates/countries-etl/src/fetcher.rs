//! Raw record retrieval from the REST Countries API or the local cache file

use crate::error::{EtlError, Result};
use countries_common::RawCountryRecord;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// Endpoint serving every country
pub const DEFAULT_API_URL: &str = "https://restcountries.com/v3.1/all";

/// Fields requested from the API; the projector reads nothing else
pub const FIELDS_OF_INTEREST: [&str; 5] = ["name", "flags", "population", "region", "area"];

/// Cache location relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = "data/raw/countries_raw.json";

/// Default HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Where a run's raw records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Cache,
    Network,
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSource::Cache => f.write_str("cache"),
            RecordSource::Network => f.write_str("network"),
        }
    }
}

/// Build `<base>?fields=a,b,c`
pub fn endpoint_url(base: &str, fields: &[&str]) -> String {
    format!("{}?fields={}", base.trim_end_matches('?'), fields.join(","))
}

/// HTTP client for the country list
pub struct RawFetcher {
    client: Client,
}

impl RawFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("countries-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// GET the endpoint and parse the body as a JSON array of records
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Vec<RawCountryRecord>> {
        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = %e, "Failed to fetch data");
            EtlError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "Country API returned an error status");
            return Err(EtlError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, "Failed to read response body");
            EtlError::from(e)
        })?;

        let records: Vec<RawCountryRecord> = serde_json::from_slice(&body).map_err(|e| {
            error!(error = %e, "Response body is not a JSON array of records");
            EtlError::data_format(url, e)
        })?;

        info!(records = records.len(), bytes = body.len(), "Extracted data from the API");
        Ok(records)
    }

    /// Use the cache when it exists, otherwise fetch and write the cache
    ///
    /// There is no freshness check: a present cache always wins.
    pub async fn load_or_fetch(
        &self,
        url: &str,
        cache_file: &Path,
    ) -> Result<(Vec<RawCountryRecord>, RecordSource)> {
        let cached = tokio::fs::try_exists(cache_file)
            .await
            .map_err(|e| EtlError::io(cache_file, e))?;

        if cached {
            let records = read_cache(cache_file).await?;
            return Ok((records, RecordSource::Cache));
        }

        let records = self.fetch(url).await?;
        write_cache(cache_file, &records).await?;
        Ok((records, RecordSource::Network))
    }
}

/// Read a cache file written by [`write_cache`]
pub async fn read_cache(path: &Path) -> Result<Vec<RawCountryRecord>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "Error reading cache file");
        EtlError::io(path, e)
    })?;

    let records: Vec<RawCountryRecord> = serde_json::from_slice(&bytes).map_err(|e| {
        error!(path = %path.display(), error = %e, "Cache file is not valid JSON");
        EtlError::data_format(path.display().to_string(), e)
    })?;

    info!(path = %path.display(), records = records.len(), "Loaded data from local file");
    Ok(records)
}

/// Write the raw records as one JSON array, creating parent directories
pub async fn write_cache(path: &Path, records: &[RawCountryRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| EtlError::io(parent, e))?;
    }

    let json = serde_json::to_vec(records)
        .map_err(|e| EtlError::data_format(path.display().to_string(), e))?;

    tokio::fs::write(path, json).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "Error writing cache file");
        EtlError::io(path, e)
    })?;

    info!(path = %path.display(), records = records.len(), "Wrote raw data cache");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn sample_records() -> Vec<RawCountryRecord> {
        vec![
            json!({
                "name": { "common": "Test Land", "official": "Republic of Test Land" },
                "flags": { "png": "https://flags.example/tl.png", "alt": "Blue field" },
                "population": 100,
                "region": "X",
                "area": 1.5
            })
            .into(),
            json!({
                "name": { "common": "Other Land", "official": "Kingdom of Other Land" },
                "flags": { "png": "https://flags.example/ol.png", "alt": "Red field" },
                "population": 200,
                "region": "Y",
                "area": 2.5
            })
            .into(),
        ]
    }

    #[test]
    fn test_endpoint_url_joins_fields() {
        assert_eq!(
            endpoint_url(DEFAULT_API_URL, &FIELDS_OF_INTEREST),
            "https://restcountries.com/v3.1/all?fields=name,flags,population,region,area"
        );
    }

    #[tokio::test]
    async fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("raw").join("countries_raw.json");
        let records = sample_records();

        write_cache(&file, &records).await.unwrap();
        let read_back = read_cache(&file).await.unwrap();

        assert_eq!(read_back, records);
    }

    #[tokio::test]
    async fn test_malformed_cache_is_data_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("countries_raw.json");
        tokio::fs::write(&file, b"[{\"name\": ").await.unwrap();

        let err = read_cache(&file).await.unwrap_err();
        assert!(matches!(err, EtlError::DataFormat { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_unreadable_cache_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_cache(&dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, EtlError::Io { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_fetch_parses_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3.1/all"))
            .and(query_param("fields", "name,flags,population,region,area"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(sample_records())))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = RawFetcher::new(Duration::from_secs(5)).unwrap();
        let url = endpoint_url(&format!("{}/v3.1/all", server.uri()), &FIELDS_OF_INTEREST);
        let records = fetcher.fetch(&url).await.unwrap();

        assert_eq!(records, sample_records());
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = RawFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();

        assert!(err.is_network());
        assert!(matches!(err, EtlError::HttpStatus { status, .. } if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn test_fetch_non_array_body_is_data_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 404 })))
            .mount(&server)
            .await;

        let fetcher = RawFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();

        assert!(matches!(err, EtlError::DataFormat { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let fetcher = RawFetcher::new(Duration::from_secs(2)).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:9/v3.1/all").await.unwrap_err();
        assert!(matches!(err, EtlError::Network(_)), "{err}");
    }

    #[tokio::test]
    async fn test_load_or_fetch_prefers_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(sample_records())))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("data").join("raw").join("countries_raw.json");
        let fetcher = RawFetcher::new(Duration::from_secs(5)).unwrap();

        let (first, source) = fetcher.load_or_fetch(&server.uri(), &cache).await.unwrap();
        assert_eq!(source, RecordSource::Network);
        assert!(cache.exists());

        let (second, source) = fetcher.load_or_fetch(&server.uri(), &cache).await.unwrap();
        assert_eq!(source, RecordSource::Cache);
        assert_eq!(first, second);
    }
}
