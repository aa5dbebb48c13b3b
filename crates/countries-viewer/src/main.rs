//! Countries Viewer - Main entry point

use anyhow::{Context, Result};
use countries_common::config::DbSettings;
use countries_common::logging::{init_logging, LogConfig};
use countries_etl::{db, PgRowCountProbe, ReadinessGate, RetryPolicy};
use countries_viewer::{config::Config, create_router, AppState};
use std::future::IntoFuture;
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over the defaults built here
    dotenvy::dotenv().ok();
    let log_config = LogConfig::builder()
        .log_file_prefix("countries-viewer")
        .filter_directives("countries_viewer=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting countries viewer");

    let config = Config::load()?;
    let db_settings = DbSettings::from_env().context("Database settings are incomplete")?;
    let target = config.table.table_ref();
    info!(
        host = %config.server.host,
        port = config.server.port,
        table = %target,
        database = %db_settings.redacted_url(),
        "Configuration loaded"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    if config.table.wait_for_data {
        let probe = PgRowCountProbe::connect_lazy(&db_settings, target.clone())?;
        let report = ReadinessGate::new(probe, RetryPolicy::default())
            .wait(&shutdown)
            .await?;
        info!(rows = report.rows, attempts = report.attempts, "Data is ready");
    }

    // The table is read once; the pool is not needed after that.
    let pool = db::connect_pool(&db_settings).await?;
    let rows = countries_viewer::db::load_countries(&pool, &target)
        .await
        .map_err(|e| {
            error!(error = %e, table = %target, "Failed to read countries table");
            e
        })?;
    pool.close().await;

    let state = AppState::new(rows, config.table.page_size);
    let app = create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Viewer listening");

    let graceful = {
        let shutdown = shutdown.clone();
        async move { shutdown.cancelled().await }
    };
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .into_future();

    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(timeout).await;
        } => {
            warn!(?timeout, "Connections still open after shutdown timeout, exiting");
        },
    }

    info!("Viewer shut down gracefully");

    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    token.cancel();
}
