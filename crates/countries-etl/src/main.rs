//! Countries ETL - load the country table and wait for it

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use countries_common::config::DbSettings;
use countries_common::logging::{init_logging, LogConfig, LogLevel};
use countries_etl::fetcher::{DEFAULT_API_URL, DEFAULT_CACHE_FILE, DEFAULT_HTTP_TIMEOUT_SECS};
use countries_etl::loader::{DEFAULT_SCHEMA, DEFAULT_TABLE};
use countries_etl::readiness::{DEFAULT_MAX_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS};
use countries_etl::{
    pipeline, LoadStrategy, PgRowCountProbe, PipelineConfig, ReadinessGate, RetryPolicy, TableRef,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "countries-etl")]
#[command(author, version, about = "Load REST Countries data into PostgreSQL")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch (or read the cache), transform and load the countries table
    Run {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// How existing rows are treated
        #[arg(long, value_enum, default_value_t = LoadStrategy::Replace)]
        strategy: LoadStrategy,
    },

    /// Block until the countries table has at least one row
    Wait {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Print the first rows of the transformed data without loading it
    Preview {
        #[command(flatten)]
        source: SourceArgs,

        /// Rows to print
        #[arg(short = 'n', long, default_value_t = 5)]
        rows: usize,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Country API endpoint
    #[arg(long, env = "COUNTRIES_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Raw JSON cache; used instead of the API when it exists
    #[arg(long, env = "COUNTRIES_CACHE_FILE", default_value = DEFAULT_CACHE_FILE)]
    cache_file: PathBuf,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    http_timeout: u64,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Destination table
    #[arg(long, default_value = DEFAULT_TABLE)]
    table: String,

    /// Destination schema
    #[arg(long, default_value = DEFAULT_SCHEMA)]
    schema: String,
}

impl TargetArgs {
    fn default_target() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }

    fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema, &self.table)
    }
}

#[derive(Args, Debug)]
struct RetryArgs {
    /// Seconds between polls
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    interval: u64,

    /// Delay multiplier per attempt (1.0 keeps the interval fixed)
    #[arg(long, default_value_t = 1.0)]
    backoff: f64,

    /// Upper bound on the delay in seconds
    #[arg(long, default_value_t = DEFAULT_MAX_INTERVAL_SECS)]
    max_interval: u64,

    /// Give up after this many polls
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl RetryArgs {
    fn policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::fixed(Duration::from_secs(self.interval))
            .with_backoff(self.backoff, Duration::from_secs(self.max_interval));
        if let Some(attempts) = self.max_attempts {
            policy = policy.with_max_attempts(attempts);
        }
        if let Some(secs) = self.timeout {
            policy = policy.with_deadline(Duration::from_secs(secs));
        }
        policy
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the defaults built here
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("countries-etl")
        .filter_directives("sqlx=warn,hyper=warn,reqwest=warn")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let outcome = match cli.command {
        Command::Run {
            source,
            target,
            strategy,
        } => run(source, target, strategy).await,
        Command::Wait { target, retry } => wait(target, retry).await,
        Command::Preview { source, rows } => preview(source, rows).await,
    };

    if let Err(e) = &outcome {
        error!(error = %format!("{e:#}"), "countries-etl failed");
    }
    outcome
}

fn pipeline_config(source: SourceArgs, target: &TargetArgs, strategy: LoadStrategy) -> PipelineConfig {
    PipelineConfig {
        api_url: source.api_url,
        cache_file: source.cache_file,
        target: target.table_ref(),
        strategy,
        http_timeout: Duration::from_secs(source.http_timeout),
    }
}

async fn run(source: SourceArgs, target: TargetArgs, strategy: LoadStrategy) -> Result<()> {
    let db_settings = DbSettings::from_env().context("Database settings are incomplete")?;
    info!(database = %db_settings.redacted_url(), "Starting countries ETL");

    let config = pipeline_config(source, &target, strategy);
    let report = pipeline::run(&config, &db_settings).await?;

    info!(
        source = %report.source,
        fetched = report.fetched,
        loaded = report.loaded,
        "ETL complete"
    );
    Ok(())
}

async fn wait(target: TargetArgs, retry: RetryArgs) -> Result<()> {
    let db_settings = DbSettings::from_env().context("Database settings are incomplete")?;

    let probe = PgRowCountProbe::connect_lazy(&db_settings, target.table_ref())?;
    let gate = ReadinessGate::new(probe, retry.policy());

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let report = gate.wait(&cancel).await?;
    info!(rows = report.rows, attempts = report.attempts, elapsed = ?report.elapsed, "Table is ready");
    Ok(())
}

async fn preview(source: SourceArgs, rows: usize) -> Result<()> {
    let config = pipeline_config(source, &TargetArgs::default_target(), LoadStrategy::Replace);
    let (frame, origin) = pipeline::extract_and_transform(&config).await?;

    info!(source = %origin, rows = frame.len(), "Previewing transformed data");
    println!("{}", frame.head(rows));
    Ok(())
}

/// Cancel the token on Ctrl+C or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
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
            info!("Received Ctrl+C, stopping");
        },
        _ = terminate => {
            info!("Received SIGTERM, stopping");
        },
    }

    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_wait_defaults_match_fixed_interval() {
        let cli = Cli::try_parse_from(["countries-etl", "wait"]).unwrap();
        let Command::Wait { target, retry } = cli.command else {
            panic!("expected wait");
        };

        assert_eq!(target.table_ref(), TableRef::default());
        assert_eq!(retry.policy(), RetryPolicy::default());
    }

    #[test]
    fn test_run_parses_strategy() {
        let cli = Cli::try_parse_from([
            "countries-etl",
            "run",
            "--strategy",
            "append",
            "--table",
            "countries_copy",
        ])
        .unwrap();
        let Command::Run { target, strategy, .. } = cli.command else {
            panic!("expected run");
        };

        assert_eq!(strategy, LoadStrategy::Append);
        assert_eq!(target.table_ref().to_string(), "public.countries_copy");
    }
}
