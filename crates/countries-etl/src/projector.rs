//! Projection of raw API records onto the flat `CountryRow` shape

use crate::error::{EtlError, Result};
use countries_common::{CountryRow, RawCountryRecord};
use serde_json::Value;
use tracing::{debug, error};

/// Project every record, stopping at the first one that cannot be projected
///
/// Output length always equals input length; no record is skipped.
pub fn project(records: &[RawCountryRecord]) -> Result<Vec<CountryRow>> {
    let rows = records
        .iter()
        .enumerate()
        .map(|(index, record)| project_record(index, record))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| {
            error!(error = %e, records = records.len(), "Projection aborted");
            e
        })?;

    debug!(rows = rows.len(), "Projected raw records");
    Ok(rows)
}

/// Project one record; `index` is only used for error reporting
pub fn project_record(index: usize, record: &RawCountryRecord) -> Result<CountryRow> {
    let field = Extractor { index, record };

    Ok(CountryRow {
        country_name: field.text("name.common", &["name", "common"])?,
        country_official_name: field.text("name.official", &["name", "official"])?,
        flag_png: field.text("flags.png", &["flags", "png"])?,
        flag_desc: field.text("flags.alt", &["flags", "alt"])?,
        population: field.count("population", &["population"])?,
        region: field.text("region", &["region"])?,
        area: field.measure("area", &["area"])?,
    })
}

struct Extractor<'a> {
    index: usize,
    record: &'a RawCountryRecord,
}

impl Extractor<'_> {
    fn get(&self, name: &'static str, path: &[&str]) -> Result<&Value> {
        self.record.lookup(path).ok_or(EtlError::MissingField {
            index: self.index,
            field: name,
        })
    }

    fn invalid(&self, name: &'static str, expected: &'static str) -> EtlError {
        EtlError::InvalidField {
            index: self.index,
            field: name,
            expected,
        }
    }

    fn text(&self, name: &'static str, path: &[&str]) -> Result<String> {
        self.get(name, path)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.invalid(name, "a string"))
    }

    fn count(&self, name: &'static str, path: &[&str]) -> Result<u64> {
        self.get(name, path)?
            .as_u64()
            .ok_or_else(|| self.invalid(name, "a non-negative integer"))
    }

    fn measure(&self, name: &'static str, path: &[&str]) -> Result<f64> {
        self.get(name, path)?
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| self.invalid(name, "a non-negative number"))
    }
}
