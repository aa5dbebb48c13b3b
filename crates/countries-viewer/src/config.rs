//! Configuration management

use crate::view_model::DEFAULT_PAGE_SIZE;
use countries_etl::loader::{DEFAULT_SCHEMA, DEFAULT_TABLE};
use countries_etl::TableRef;
use serde::{Deserialize, Serialize};

// ============================================================================
// Viewer Configuration Constants
// ============================================================================

/// Default bind address.
pub const DEFAULT_VIEWER_HOST: &str = "0.0.0.0";

/// Default port.
pub const DEFAULT_VIEWER_PORT: u16 = 8050;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Default CORS allowed origin.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub table: TableConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// What is read and how it is paged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub schema: String,
    pub table: String,
    pub page_size: usize,
    /// Run the readiness gate before reading the table
    pub wait_for_data: bool,
}

impl TableConfig {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema, &self.table)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup; unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            server: ServerConfig {
                host: lookup("VIEWER_HOST").unwrap_or_else(|| DEFAULT_VIEWER_HOST.to_string()),
                port: parsed(&lookup, "VIEWER_PORT").unwrap_or(DEFAULT_VIEWER_PORT),
                shutdown_timeout_secs: parsed(&lookup, "VIEWER_SHUTDOWN_TIMEOUT")
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            table: TableConfig {
                schema: lookup("VIEWER_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
                table: lookup("VIEWER_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                page_size: parsed(&lookup, "VIEWER_PAGE_SIZE").unwrap_or(DEFAULT_PAGE_SIZE),
                wait_for_data: parsed(&lookup, "VIEWER_WAIT_FOR_DATA").unwrap_or(false),
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Viewer port must be greater than 0");
        }

        if self.table.page_size == 0 {
            anyhow::bail!("Viewer page size must be greater than 0");
        }

        if self.table.table.trim().is_empty() || self.table.schema.trim().is_empty() {
            anyhow::bail!("Viewer table and schema cannot be empty");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_VIEWER_HOST.to_string(),
                port: DEFAULT_VIEWER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            table: TableConfig {
                schema: DEFAULT_SCHEMA.to_string(),
                table: DEFAULT_TABLE.to_string(),
                page_size: DEFAULT_PAGE_SIZE,
                wait_for_data: false,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
            },
        }
    }
}
