//! Readiness gate: blocks a dependent process until the countries table has rows
//!
//! The gate polls a row count on a fixed (or optionally growing) interval.
//! Failures are split into two kinds:
//!
//! - **Transient**: the store is unreachable, still starting, or the table has
//!   not been created yet. Logged as a warning; polling continues.
//! - **Fatal**: anything that will not fix itself by waiting (bad credentials,
//!   permission denied, malformed SQL). Returned immediately.
//!
//! The default [`RetryPolicy`] never gives up on its own; callers stop it by
//! cancelling the [`CancellationToken`] or by configuring an attempt limit or
//! deadline.

use crate::loader::{count_rows, TableRef};
use async_trait::async_trait;
use countries_common::config::DbSettings;
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Default seconds between polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default cap on the delay when a backoff multiplier is configured.
pub const DEFAULT_MAX_INTERVAL_SECS: u64 = 60;

/// Gate state after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Waiting,
    Ready { rows: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    Fatal,
}

/// Decide whether waiting could make a failed count succeed
pub fn classify(err: &sqlx::Error) -> FailureKind {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => FailureKind::Transient,
        sqlx::Error::Database(db) => match db.code() {
            Some(code) if is_transient_sqlstate(&code) => FailureKind::Transient,
            _ => FailureKind::Fatal,
        },
        _ => FailureKind::Fatal,
    }
}

/// SQLSTATEs that clear up once the database finishes starting or the
/// pipeline creates the table
fn is_transient_sqlstate(code: &str) -> bool {
    // 08xxx connection exception, 57P03 cannot_connect_now,
    // 3D000 database missing, 42P01 table missing
    code.starts_with("08") || matches!(code, "57P03" | "3D000" | "42P01")
}

/// Poll timing and limits
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// Growth factor applied per attempt; 1.0 keeps the interval fixed
    pub multiplier: f64,
    pub max_interval: Duration,
    pub max_attempts: Option<u32>,
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
    }
}

impl RetryPolicy {
    /// Same delay forever, no limits
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            multiplier: 1.0,
            max_interval: Duration::from_secs(DEFAULT_MAX_INTERVAL_SECS).max(interval),
            max_attempts: None,
            deadline: None,
        }
    }

    pub fn with_backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.multiplier = multiplier;
        self.max_interval = max_interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Delay after the given 1-based attempt, capped at `max_interval`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let cap = self.max_interval.max(self.interval);
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.multiplier.max(1.0).powi(exponent);
        let secs = (self.interval.as_secs_f64() * factor).min(cap.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(cap)
    }
}

/// Source of the row count being waited on
#[async_trait]
pub trait RowCountProbe: Send + Sync {
    async fn count_rows(&self) -> Result<i64, sqlx::Error>;

    /// Name used in log lines
    fn target(&self) -> String;
}

/// Counts rows in a PostgreSQL table
pub struct PgRowCountProbe {
    pool: PgPool,
    table: TableRef,
}

impl PgRowCountProbe {
    pub fn new(pool: PgPool, table: TableRef) -> Self {
        Self { pool, table }
    }

    /// Build a probe whose pool connects on first use, so an unreachable
    /// store shows up as a transient poll failure instead of a startup error
    pub fn connect_lazy(settings: &DbSettings, table: TableRef) -> Result<Self, sqlx::Error> {
        Ok(Self::new(crate::db::connect_lazy(settings)?, table))
    }
}

#[async_trait]
impl RowCountProbe for PgRowCountProbe {
    async fn count_rows(&self) -> Result<i64, sqlx::Error> {
        count_rows(&self.pool, &self.table).await
    }

    fn target(&self) -> String {
        self.table.to_string()
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Readiness check failed on attempt {attempt}: {source}")]
    Fatal {
        attempt: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("Readiness gate cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    #[error("Table still empty after {attempts} attempts ({elapsed:?})")]
    Exhausted { attempts: u32, elapsed: Duration },
}

/// Result of a gate that reached READY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateReport {
    pub attempts: u32,
    pub rows: i64,
    pub elapsed: Duration,
}

pub struct ReadinessGate<P> {
    probe: P,
    policy: RetryPolicy,
}

impl<P: RowCountProbe> ReadinessGate<P> {
    pub fn new(probe: P, policy: RetryPolicy) -> Self {
        Self { probe, policy }
    }

    /// One poll; transient failures map to `Waiting`
    pub async fn poll_once(&self, attempt: u32) -> Result<GateState, GateError> {
        let target = self.probe.target();

        match self.probe.count_rows().await {
            Ok(rows) if rows > 0 => Ok(GateState::Ready { rows }),
            Ok(_) => {
                info!(attempt, table = %target, "Table is empty, waiting...");
                Ok(GateState::Waiting)
            },
            Err(e) => match classify(&e) {
                FailureKind::Transient => {
                    warn!(attempt, table = %target, error = %e, "Database not ready yet");
                    Ok(GateState::Waiting)
                },
                FailureKind::Fatal => {
                    error!(attempt, table = %target, error = %e, "Readiness check failed");
                    Err(GateError::Fatal { attempt, source: e })
                },
            },
        }
    }

    /// Poll until the table has rows, a fatal error, a limit, or cancellation
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<GateReport, GateError> {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        info!(table = %self.probe.target(), interval = ?self.policy.interval, "Waiting for data");

        loop {
            if cancel.is_cancelled() {
                return Err(GateError::Cancelled { attempts: attempt });
            }
            attempt = attempt.saturating_add(1);

            let state = tokio::select! {
                _ = cancel.cancelled() => return Err(GateError::Cancelled { attempts: attempt }),
                state = self.poll_once(attempt) => state?,
            };

            if let GateState::Ready { rows } = state {
                let elapsed = started.elapsed();
                info!(table = %self.probe.target(), rows, attempt, "Data ready");
                return Ok(GateReport {
                    attempts: attempt,
                    rows,
                    elapsed,
                });
            }

            if self.policy.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(GateError::Exhausted {
                    attempts: attempt,
                    elapsed: started.elapsed(),
                });
            }

            let mut delay = self.policy.delay_for(attempt);
            if let Some(deadline) = self.policy.deadline {
                let elapsed = started.elapsed();
                if elapsed >= deadline {
                    return Err(GateError::Exhausted {
                        attempts: attempt,
                        elapsed,
                    });
                }
                delay = delay.min(deadline - elapsed);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(GateError::Cancelled { attempts: attempt }),
                _ = tokio::time::sleep(delay) => {},
            }
        }
    }
}
