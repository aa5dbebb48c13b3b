//! Read side of the countries table

use countries_common::CountryRow;
use countries_etl::TableRef;
use sqlx::PgPool;

type RowTuple = (String, String, String, String, i64, String, f64);

/// Read every row once, in storage order
///
/// A negative population fails the whole read; the pipeline never writes one.
#[tracing::instrument(skip(pool), fields(table = %target))]
pub async fn load_countries(pool: &PgPool, target: &TableRef) -> Result<Vec<CountryRow>, sqlx::Error> {
    let sql = format!(
        "SELECT country_name, country_official_name, flag_png, flag_desc, population, region, area \
         FROM {}",
        target.qualified()
    );

    let rows = sqlx::query_as::<_, RowTuple>(&sql)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(into_country_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            tracing::error!(error = %e, "Countries table holds an invalid row");
            e
        })?;

    tracing::info!(rows = rows.len(), "Loaded countries table");
    Ok(rows)
}

fn into_country_row(
    (country_name, country_official_name, flag_png, flag_desc, population, region, area): RowTuple,
) -> Result<CountryRow, sqlx::Error> {
    let population = u64::try_from(population).map_err(|_| sqlx::Error::ColumnDecode {
        index: "population".to_string(),
        source: format!("negative population {population} for {country_name}").into(),
    })?;

    Ok(CountryRow {
        country_name,
        country_official_name,
        flag_png,
        flag_desc,
        population,
        region,
        area,
    })
}
