//! Domain types for country records

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One country object exactly as the REST Countries API returned it
///
/// The structure is kept opaque so the cache file round-trips byte-for-byte
/// equivalent JSON; fields are pulled out by path during projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawCountryRecord(pub Value);

impl RawCountryRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Follow a path of object keys, e.g. `["name", "common"]`
    ///
    /// Returns `None` when any segment is absent or the value is JSON null.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.0, |value, key| value.get(*key))
            .filter(|value| !value.is_null())
    }
}

impl From<Value> for RawCountryRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Flat country row persisted to the `countries` table and shown in the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRow {
    pub country_name: String,
    pub country_official_name: String,
    pub flag_png: String,
    pub flag_desc: String,
    pub population: u64,
    pub region: String,
    pub area: f64,
}

impl CountryRow {
    /// Column names in declaration order; table columns follow this order.
    pub const COLUMNS: [&'static str; 7] = [
        "country_name",
        "country_official_name",
        "flag_png",
        "flag_desc",
        "population",
        "region",
        "area",
    ];

    /// Display text of a column, used for filtering and rendering
    pub fn column_text(&self, column: &str) -> Option<String> {
        let text = match column {
            "country_name" => self.country_name.clone(),
            "country_official_name" => self.country_official_name.clone(),
            "flag_png" => self.flag_png.clone(),
            "flag_desc" => self.flag_desc.clone(),
            "population" => self.population.to_string(),
            "region" => self.region.clone(),
            "area" => self.area.to_string(),
            _ => return None,
        };
        Some(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_path() {
        let record = RawCountryRecord::new(json!({
            "name": { "common": "Test Land", "official": null },
            "population": 100
        }));

        assert_eq!(record.lookup(&["name", "common"]), Some(&json!("Test Land")));
        assert_eq!(record.lookup(&["population"]), Some(&json!(100)));
        assert!(record.lookup(&["name", "official"]).is_none());
        assert!(record.lookup(&["flags", "png"]).is_none());
    }

    #[test]
    fn test_raw_record_serializes_transparently() {
        let value = json!({ "region": "X", "area": 1.5 });
        let record = RawCountryRecord::from(value.clone());

        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_column_text_covers_every_column() {
        let row = CountryRow {
            country_name: "Test Land".to_string(),
            country_official_name: "Republic of Test Land".to_string(),
            flag_png: "https://flags.example/tl.png".to_string(),
            flag_desc: "A plain flag".to_string(),
            population: 100,
            region: "X".to_string(),
            area: 1.5,
        };

        for column in CountryRow::COLUMNS {
            assert!(row.column_text(column).is_some(), "{column}");
        }
        assert_eq!(row.column_text("area").as_deref(), Some("1.5"));
        assert!(row.column_text("capital").is_none());
    }
}
