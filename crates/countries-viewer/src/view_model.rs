//! Framework-free view model for the country table
//!
//! Everything the page shows is a pure function of the loaded rows and a
//! [`ViewState`]: which column is sorted and in which direction, the filter
//! text, the page, and the selected index. The selected index always refers
//! to a position in the *derived* view (after sort and filter), never to the
//! storage order of the table.

use countries_common::CountryRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Shown when nothing is selected.
pub const PLACEHOLDER_MESSAGE: &str = "Select a country to see its flag.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown sort column '{0}'")]
pub struct UnknownColumn(pub String);

/// Sort key; the column is always one of [`CountryRow::COLUMNS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: &str, direction: SortDirection) -> Result<Self, UnknownColumn> {
        let column = CountryRow::COLUMNS
            .into_iter()
            .find(|c| *c == column)
            .ok_or_else(|| UnknownColumn(column.to_string()))?;

        Ok(Self { column, direction })
    }

    fn compare(&self, a: &CountryRow, b: &CountryRow) -> Ordering {
        let ordering = match self.column {
            "country_name" => a.country_name.cmp(&b.country_name),
            "country_official_name" => a.country_official_name.cmp(&b.country_official_name),
            "flag_png" => a.flag_png.cmp(&b.flag_png),
            "flag_desc" => a.flag_desc.cmp(&b.flag_desc),
            "population" => a.population.cmp(&b.population),
            "region" => a.region.cmp(&b.region),
            "area" => a.area.total_cmp(&b.area),
            _ => Ordering::Equal,
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Everything a request can say about how the table is presented
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub sort: Option<SortSpec>,
    pub filter: String,
    /// 1-based
    pub page: usize,
    /// Index into the derived view
    pub selected: Option<usize>,
}

/// Sorted and filtered view over the full table
///
/// Holds indices into the loaded rows so nothing is cloned.
#[derive(Debug, Clone)]
pub struct DerivedView<'a> {
    rows: &'a [CountryRow],
    order: Vec<usize>,
}

impl<'a> DerivedView<'a> {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Row at `index` of the derived view
    pub fn get(&self, index: usize) -> Option<&'a CountryRow> {
        self.order.get(index).map(|&i| &self.rows[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CountryRow> + '_ {
        self.order.iter().map(|&i| &self.rows[i])
    }
}

/// Apply the filter then a stable sort
///
/// The filter is a case-insensitive substring match against every column;
/// blank filters keep every row.
pub fn derive_view<'a>(
    rows: &'a [CountryRow],
    sort: Option<&SortSpec>,
    filter: &str,
) -> DerivedView<'a> {
    let needle = filter.trim().to_lowercase();

    let mut order: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| needle.is_empty() || matches_filter(row, &needle))
        .map(|(i, _)| i)
        .collect();

    if let Some(sort) = sort {
        order.sort_by(|&a, &b| sort.compare(&rows[a], &rows[b]));
    }

    DerivedView { rows, order }
}

fn matches_filter(row: &CountryRow, needle: &str) -> bool {
    CountryRow::COLUMNS.iter().any(|column| {
        row.column_text(column)
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

/// Pagination metadata for a page of the derived view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One row on a page, tagged with its derived-view index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub row: &'a CountryRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a> {
    pub rows: Vec<PageRow<'a>>,
    pub meta: PageMeta,
}

/// Slice a 1-based page out of the view; out-of-range pages are clamped
pub fn page<'a>(view: &DerivedView<'a>, page: usize, page_size: usize) -> Page<'a> {
    let per_page = page_size.max(1);
    let total = view.len();
    let pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, pages);
    let start = (page - 1) * per_page;

    let rows = (start..total.min(start + per_page))
        .filter_map(|index| view.get(index).map(|row| PageRow { index, row }))
        .collect();

    Page {
        rows,
        meta: PageMeta {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        },
    }
}

/// Right-hand pane content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailPanel {
    Placeholder { message: String },
    Flag { country_name: String, flag_png: String },
    NoFlag { message: String },
}

impl DetailPanel {
    pub fn placeholder() -> Self {
        DetailPanel::Placeholder {
            message: PLACEHOLDER_MESSAGE.to_string(),
        }
    }

    /// Heading above the flag image, if there is one
    pub fn heading(&self) -> Option<String> {
        match self {
            DetailPanel::Flag { country_name, .. } => Some(format!("Flag of {country_name}")),
            _ => None,
        }
    }
}

/// Map the selected derived-view index to the detail pane
pub fn detail_panel(view: &DerivedView<'_>, selected: Option<usize>) -> DetailPanel {
    let Some(row) = selected.and_then(|index| view.get(index)) else {
        return DetailPanel::placeholder();
    };

    if row.flag_png.is_empty() {
        DetailPanel::NoFlag {
            message: format!("No flag URL available for {}.", row.country_name),
        }
    } else {
        DetailPanel::Flag {
            country_name: row.country_name.clone(),
            flag_png: row.flag_png.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, population: u64, region: &str, area: f64) -> CountryRow {
        CountryRow {
            country_name: name.to_string(),
            country_official_name: format!("Official {name}"),
            flag_png: format!("https://flags.example/{}.png", name.to_lowercase()),
            flag_desc: String::new(),
            population,
            region: region.to_string(),
            area,
        }
    }

    fn table() -> Vec<CountryRow> {
        vec![
            row("Test Land", 100, "X", 1.5),
            row("Other Land", 200, "Y", 2.5),
            row("Alpha", 50, "X", 9.0),
        ]
    }

    fn names(view: &DerivedView<'_>) -> Vec<String> {
        view.iter().map(|r| r.country_name.clone()).collect()
    }

    #[test]
    fn test_unsorted_view_keeps_storage_order() {
        let rows = table();
        let view = derive_view(&rows, None, "");
        assert_eq!(names(&view), vec!["Test Land", "Other Land", "Alpha"]);
    }

    #[test]
    fn test_sort_by_text_and_number() {
        let rows = table();

        let by_name = SortSpec::new("country_name", SortDirection::Asc).unwrap();
        assert_eq!(
            names(&derive_view(&rows, Some(&by_name), "")),
            vec!["Alpha", "Other Land", "Test Land"]
        );

        let by_population = SortSpec::new("population", SortDirection::Desc).unwrap();
        assert_eq!(
            names(&derive_view(&rows, Some(&by_population), "")),
            vec!["Other Land", "Test Land", "Alpha"]
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let rows = table();
        let by_region = SortSpec::new("region", SortDirection::Asc).unwrap();

        assert_eq!(
            names(&derive_view(&rows, Some(&by_region), "")),
            vec!["Test Land", "Alpha", "Other Land"]
        );
    }

    #[test]
    fn test_unknown_sort_column() {
        assert_eq!(
            SortSpec::new("capital", SortDirection::Asc).unwrap_err(),
            UnknownColumn("capital".to_string())
        );
    }

    #[test]
    fn test_filter_is_case_insensitive_across_columns() {
        let rows = table();

        assert_eq!(names(&derive_view(&rows, None, "LAND")), vec!["Test Land", "Other Land"]);
        assert_eq!(names(&derive_view(&rows, None, "200")), vec!["Other Land"]);
        assert!(derive_view(&rows, None, "atlantis").is_empty());
        assert_eq!(derive_view(&rows, None, "   ").len(), 3);
    }

    #[test]
    fn test_pagination() {
        let rows: Vec<CountryRow> = (0..23).map(|i| row(&format!("C{i:02}"), i, "R", 1.0)).collect();
        let view = derive_view(&rows, None, "");

        let first = page(&view, 1, DEFAULT_PAGE_SIZE);
        assert_eq!(first.rows.len(), 10);
        assert_eq!(first.meta.pages, 3);
        assert!(first.meta.has_next && !first.meta.has_prev);

        let last = page(&view, 3, DEFAULT_PAGE_SIZE);
        assert_eq!(last.rows.len(), 3);
        assert_eq!(last.rows[0].index, 20);
        assert!(!last.meta.has_next);

        // Beyond the end clamps to the last page, zero clamps to the first
        assert_eq!(page(&view, 99, DEFAULT_PAGE_SIZE).meta.page, 3);
        assert_eq!(page(&view, 0, DEFAULT_PAGE_SIZE).meta.page, 1);
    }

    #[test]
    fn test_empty_view_has_one_empty_page() {
        let view = derive_view(&[], None, "");
        let empty = page(&view, 1, DEFAULT_PAGE_SIZE);

        assert!(empty.rows.is_empty());
        assert_eq!((empty.meta.page, empty.meta.pages, empty.meta.total), (1, 1, 0));
    }

    #[test]
    fn test_no_selection_shows_placeholder() {
        let rows = table();
        let view = derive_view(&rows, None, "");

        assert_eq!(
            detail_panel(&view, None),
            DetailPanel::Placeholder {
                message: "Select a country to see its flag.".to_string()
            }
        );
    }

    #[test]
    fn test_selection_follows_derived_order() {
        let rows = table();
        let sort = SortSpec::new("country_name", SortDirection::Asc).unwrap();
        let view = derive_view(&rows, Some(&sort), "");

        let panel = detail_panel(&view, Some(0));

        assert_eq!(
            panel,
            DetailPanel::Flag {
                country_name: "Alpha".to_string(),
                flag_png: "https://flags.example/alpha.png".to_string(),
            }
        );
        assert_eq!(panel.heading().as_deref(), Some("Flag of Alpha"));
    }

    #[test]
    fn test_missing_flag_falls_back_to_text() {
        let mut rows = table();
        rows[0].flag_png.clear();
        let view = derive_view(&rows, None, "");

        assert_eq!(
            detail_panel(&view, Some(0)),
            DetailPanel::NoFlag {
                message: "No flag URL available for Test Land.".to_string()
            }
        );
    }

    #[test]
    fn test_out_of_range_selection_shows_placeholder() {
        let rows = table();
        let view = derive_view(&rows, None, "other");

        assert_eq!(detail_panel(&view, Some(1)), DetailPanel::placeholder());
    }
}
