//! Reads the table written by the ETL pipeline from a real PostgreSQL container
//!
//! Run with: `cargo test -p countries-viewer --test db_read_test -- --ignored`

mod common;

use common::{init_test_tracing, TestPostgres};
use countries_common::CountryRow;
use countries_etl::{LoadStrategy, Loader, TableRef};
use countries_viewer::db::load_countries;

fn fixture() -> Vec<CountryRow> {
    vec![
        CountryRow {
            country_name: "Test Land".to_string(),
            country_official_name: "Republic of Test Land".to_string(),
            flag_png: "https://flags.example/tl.png".to_string(),
            flag_desc: "Blue field".to_string(),
            population: 100,
            region: "X".to_string(),
            area: 1.5,
        },
        CountryRow {
            country_name: "Other Land".to_string(),
            country_official_name: "Kingdom of Other Land".to_string(),
            flag_png: String::new(),
            flag_desc: String::new(),
            population: 200,
            region: "Y".to_string(),
            area: 2.5,
        },
    ]
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_reads_rows_written_by_loader() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();
    let target = TableRef::default();

    Loader::new(pg.pool().clone())
        .load(&fixture(), &target, LoadStrategy::Replace)
        .await
        .unwrap();

    let rows = load_countries(pg.pool(), &target).await.unwrap();

    assert_eq!(rows, fixture());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_missing_table_is_an_error() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();

    let err = load_countries(pg.pool(), &TableRef::new("public", "absent"))
        .await
        .unwrap_err();

    assert!(matches!(err, sqlx::Error::Database(_)));
}
