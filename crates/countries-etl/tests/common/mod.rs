//! Shared helpers for countries-etl integration tests
//!
//! Each test starts its own PostgreSQL container through testcontainers, so
//! Docker must be available. Tests using these helpers are `#[ignore]`d by
//! default; run them with `cargo test -- --ignored`.

#![allow(dead_code)]

use anyhow::{Context, Result};
use countries_common::config::DbSettings;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::{debug, info};

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

/// PostgreSQL container with a connected pool
pub struct TestPostgres {
    container: ContainerAsync<Postgres>,
    pool: PgPool,
    settings: DbSettings,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let settings = DbSettings::from_lookup(|key| {
            Some(match key {
                "DB_HOST" => host.to_string(),
                "DB_PORT" => port.to_string(),
                _ => "postgres".to_string(),
            })
        })?;

        debug!(url = %settings.redacted_url(), "PostgreSQL test container ready");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&settings.connection_url())
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self {
            container,
            pool,
            settings,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Settings pointing at this container, as `DbSettings::from_env` would build them
    pub fn settings(&self) -> &DbSettings {
        &self.settings
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Raw API record with every field the projector reads
pub fn raw_country(name: &str, population: u64, region: &str, area: f64) -> serde_json::Value {
    json!({
        "name": { "common": name, "official": format!("Official {name}") },
        "flags": {
            "png": format!("https://flags.example/{}.png", name.to_lowercase().replace(' ', "-")),
            "alt": format!("Flag of {name}")
        },
        "population": population,
        "region": region,
        "area": area
    })
}

/// Write `records` as a cache file under `dir` and return its path
pub fn write_cache(dir: &Path, records: &[serde_json::Value]) -> PathBuf {
    let file = dir.join("data").join("raw").join("countries_raw.json");
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(&file, serde_json::to_vec(records).unwrap()).unwrap();
    file
}

/// Initialize tracing for tests (call once per test)
pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,countries_etl=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}
