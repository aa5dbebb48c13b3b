//! Columnar in-memory table built from projected rows

use countries_common::CountryRow;
use std::fmt;

/// Typed values of a single column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<String>),
    Integer(Vec<i64>),
    Float(Vec<f64>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// PostgreSQL type used when the column is created
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnData::Text(_) => "TEXT",
            ColumnData::Integer(_) => "BIGINT",
            ColumnData::Float(_) => "DOUBLE PRECISION",
        }
    }

    /// Array type used to bind the whole column at once
    pub fn sql_array_type(&self) -> &'static str {
        match self {
            ColumnData::Text(_) => "TEXT[]",
            ColumnData::Integer(_) => "BIGINT[]",
            ColumnData::Float(_) => "DOUBLE PRECISION[]",
        }
    }

    fn cell(&self, row: usize) -> String {
        match self {
            ColumnData::Text(v) => v[row].clone(),
            ColumnData::Integer(v) => v[row].to_string(),
            ColumnData::Float(v) => v[row].to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub data: ColumnData,
}

/// Rows pivoted into columns, in `CountryRow` declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct CountryFrame {
    columns: Vec<Column>,
    rows: usize,
}

impl CountryFrame {
    pub fn from_rows(rows: &[CountryRow]) -> Self {
        // Populations beyond i64::MAX cannot exist; saturate rather than wrap.
        let population = rows
            .iter()
            .map(|r| i64::try_from(r.population).unwrap_or(i64::MAX))
            .collect();

        let data = [
            text_column(rows, |r| r.country_name.as_str()),
            text_column(rows, |r| r.country_official_name.as_str()),
            text_column(rows, |r| r.flag_png.as_str()),
            text_column(rows, |r| r.flag_desc.as_str()),
            ColumnData::Integer(population),
            text_column(rows, |r| r.region.as_str()),
            ColumnData::Float(rows.iter().map(|r| r.area).collect()),
        ];

        let columns = CountryRow::COLUMNS
            .into_iter()
            .zip(data)
            .map(|(name, data)| Column { name, data })
            .collect();

        Self {
            columns,
            rows: rows.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    /// First `n` rows as an aligned text table
    pub fn head(&self, n: usize) -> Head<'_> {
        Head {
            frame: self,
            rows: n.min(self.rows),
        }
    }
}

fn text_column(rows: &[CountryRow], field: impl Fn(&CountryRow) -> &str) -> ColumnData {
    ColumnData::Text(rows.iter().map(|r| field(r).to_owned()).collect())
}

/// Display adapter returned by [`CountryFrame::head`]
pub struct Head<'a> {
    frame: &'a CountryFrame,
    rows: usize,
}

impl fmt::Display for Head<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .frame
            .columns
            .iter()
            .map(|c| (0..self.rows).map(|r| c.data.cell(r)).collect())
            .collect();

        let widths: Vec<usize> = self
            .frame
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, values)| {
                values
                    .iter()
                    .map(|v| v.chars().count())
                    .chain(std::iter::once(c.name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let index_width = self.rows.saturating_sub(1).to_string().len();

        write!(f, "{:index_width$}", "")?;
        for (column, &width) in self.frame.columns.iter().zip(&widths) {
            write!(f, "  {:<width$}", column.name)?;
        }
        writeln!(f)?;

        for row in 0..self.rows {
            write!(f, "{:<index_width$}", row)?;
            for (values, &width) in cells.iter().zip(&widths) {
                write!(f, "  {:<width$}", values[row])?;
            }
            writeln!(f)?;
        }

        write!(f, "[{} rows x {} columns]", self.frame.rows, self.frame.columns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<CountryRow> {
        vec![
            CountryRow {
                country_name: "Test Land".to_string(),
                country_official_name: "Republic of Test Land".to_string(),
                flag_png: "https://flags.example/tl.png".to_string(),
                flag_desc: "Blue".to_string(),
                population: 100,
                region: "X".to_string(),
                area: 1.5,
            },
            CountryRow {
                country_name: "Other Land".to_string(),
                country_official_name: "Kingdom of Other Land".to_string(),
                flag_png: "https://flags.example/ol.png".to_string(),
                flag_desc: "Red".to_string(),
                population: 200,
                region: "Y".to_string(),
                area: 2.5,
            },
        ]
    }

    #[test]
    fn test_columns_follow_declaration_order() {
        let frame = CountryFrame::from_rows(&rows());

        assert_eq!(frame.column_names(), CountryRow::COLUMNS.to_vec());
        assert_eq!(frame.len(), 2);
        assert!(frame.columns().iter().all(|c| c.data.len() == 2));
    }

    #[test]
    fn test_column_types() {
        let frame = CountryFrame::from_rows(&rows());

        assert_eq!(frame.column("population"), Some(&ColumnData::Integer(vec![100, 200])));
        assert_eq!(frame.column("area"), Some(&ColumnData::Float(vec![1.5, 2.5])));
        assert_eq!(frame.column("region").map(ColumnData::sql_type), Some("TEXT"));
        assert!(frame.column("capital").is_none());
    }

    #[test]
    fn test_empty_frame_keeps_schema() {
        let frame = CountryFrame::from_rows(&[]);

        assert!(frame.is_empty());
        assert_eq!(frame.columns().len(), CountryRow::COLUMNS.len());
    }

    #[test]
    fn test_head_renders_header_and_rows() {
        let frame = CountryFrame::from_rows(&rows());
        let rendered = frame.head(1).to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[0].contains("country_name"));
        assert!(lines[1].starts_with('0'));
        assert!(lines[1].contains("Test Land"));
        assert!(!rendered.contains("Other Land"));
        assert_eq!(lines[2], "[2 rows x 7 columns]");
    }
}
