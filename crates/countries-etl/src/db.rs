//! Connection pool construction

use countries_common::config::DbSettings;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

fn pool_options(settings: &DbSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
}

/// Connect eagerly; fails if the database cannot be reached now
pub async fn connect_pool(settings: &DbSettings) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(settings)
        .connect(&settings.connection_url())
        .await?;

    tracing::info!(
        url = %settings.redacted_url(),
        max_connections = settings.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Pool that opens its first connection on first use
pub fn connect_lazy(settings: &DbSettings) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(settings).connect_lazy(&settings.connection_url())?;
    tracing::debug!(url = %settings.redacted_url(), "Lazy database pool created");
    Ok(pool)
}
