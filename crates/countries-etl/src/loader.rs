//! Tabular loader: writes a `CountryFrame` into PostgreSQL
//!
//! The default strategy drops and recreates the destination table on every
//! run, so the table always holds exactly the latest batch. All statements of
//! one load run in a single transaction; PostgreSQL DDL is transactional, so
//! readers never observe a dropped-but-not-refilled table.

use crate::error::{EtlError, Result};
use crate::frame::{ColumnData, CountryFrame};
use countries_common::CountryRow;
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Postgres};
use tracing::{error, info};

/// Default destination table.
pub const DEFAULT_TABLE: &str = "countries";

/// Default destination schema.
pub const DEFAULT_SCHEMA: &str = "public";

/// How a load treats rows already in the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LoadStrategy {
    /// Drop the table, recreate it from the frame, insert every row
    #[default]
    Replace,
    /// Create the table if needed and insert after existing rows
    Append,
    /// Reserved; rejected before any I/O
    UpsertByKey,
}

impl std::fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStrategy::Replace => f.write_str("replace"),
            LoadStrategy::Append => f.write_str("append"),
            LoadStrategy::UpsertByKey => f.write_str("upsert-by-key"),
        }
    }
}

/// Schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Quoted identifier safe to splice into SQL, e.g. `"public"."countries"`
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl Default for TableRef {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA, DEFAULT_TABLE)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub table: TableRef,
    pub strategy: LoadStrategy,
}

/// Writes frames to the relational store
#[derive(Clone)]
pub struct Loader {
    pool: PgPool,
}

impl Loader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pivot `rows` into a frame and write it with `strategy`
    pub async fn load(
        &self,
        rows: &[CountryRow],
        target: &TableRef,
        strategy: LoadStrategy,
    ) -> Result<LoadReport> {
        let frame = CountryFrame::from_rows(rows);
        self.load_frame(&frame, target, strategy).await
    }

    #[tracing::instrument(skip_all, fields(rows = frame.len(), table = %target, strategy = %strategy))]
    pub async fn load_frame(
        &self,
        frame: &CountryFrame,
        target: &TableRef,
        strategy: LoadStrategy,
    ) -> Result<LoadReport> {
        if strategy == LoadStrategy::UpsertByKey {
            return Err(EtlError::UnsupportedStrategy(strategy));
        }

        self.write(frame, target, strategy).await.map_err(|source| {
            error!(
                error = %source,
                rows = frame.len(),
                table = %target,
                "Error writing to the database"
            );
            EtlError::Persistence {
                rows: frame.len(),
                table: target.to_string(),
                source,
            }
        })?;

        info!(rows = frame.len(), table = %target, %strategy, "Rows written to DB");

        Ok(LoadReport {
            rows: frame.len(),
            table: target.clone(),
            strategy,
        })
    }

    async fn write(
        &self,
        frame: &CountryFrame,
        target: &TableRef,
        strategy: LoadStrategy,
    ) -> std::result::Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if strategy == LoadStrategy::Replace {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", target.qualified()))
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(&create_table_sql(frame, target))
            .execute(&mut *tx)
            .await?;

        if !frame.is_empty() {
            let sql = insert_sql(frame, target);
            let mut query = sqlx::query(&sql);
            for column in frame.columns() {
                query = bind_column(query, &column.data);
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await
    }
}

fn bind_column<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    data: &'q ColumnData,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match data {
        ColumnData::Text(values) => query.bind(values),
        ColumnData::Integer(values) => query.bind(values),
        ColumnData::Float(values) => query.bind(values),
    }
}

fn create_table_sql(frame: &CountryFrame, target: &TableRef) -> String {
    let columns = frame
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_ident(c.name), c.data.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE IF NOT EXISTS {} ({})", target.qualified(), columns)
}

/// One statement for the whole batch: each column is bound as an array and
/// zipped back into rows with `UNNEST`.
fn insert_sql(frame: &CountryFrame, target: &TableRef) -> String {
    let names = frame
        .columns()
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let arrays = frame
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| format!("${}::{}", i + 1, c.data.sql_array_type()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) SELECT * FROM UNNEST({})",
        target.qualified(),
        names,
        arrays
    )
}

/// `SELECT COUNT(*)` against the table
pub async fn count_rows(pool: &PgPool, target: &TableRef) -> std::result::Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", target.qualified()))
        .fetch_one(pool)
        .await
}
