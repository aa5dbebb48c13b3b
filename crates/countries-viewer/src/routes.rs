//! HTTP handlers
//!
//! Every handler re-derives the view from the in-memory rows and the query
//! string, so the server keeps no per-client state.

use crate::error::AppError;
use crate::page;
use crate::view_model::{
    self, derive_view, detail_panel, DetailPanel, PageMeta, PageRow, SortDirection, SortSpec,
    UnknownColumn, ViewState,
};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Query parameters shared by the page and the JSON API
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub sort: Option<String>,
    pub dir: Option<SortDirection>,
    pub filter: Option<String>,
    pub page: Option<usize>,
    pub selected: Option<usize>,
}

impl ViewQuery {
    pub fn into_state(self) -> Result<ViewState, UnknownColumn> {
        let sort = match self.sort.as_deref().filter(|s| !s.is_empty()) {
            Some(column) => Some(SortSpec::new(column, self.dir.unwrap_or_default())?),
            None => None,
        };

        Ok(ViewState {
            sort,
            filter: self.filter.unwrap_or_default(),
            page: self.page.unwrap_or(1).max(1),
            selected: self.selected,
        })
    }
}

#[derive(Debug, Serialize)]
struct CountriesPage<'a> {
    data: Vec<PageRow<'a>>,
    meta: PageMeta,
    sort: Option<SortSpec>,
    filter: &'a str,
}

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> Result<Html<String>, AppError> {
    let Query(query) = query?;
    let view_state = query.into_state()?;
    let view = derive_view(&state.rows, view_state.sort.as_ref(), &view_state.filter);
    let current = view_model::page(&view, view_state.page, state.page_size);
    let panel = detail_panel(&view, view_state.selected);

    Ok(Html(page::render(&view_state, &current, &panel)))
}

/// `GET /api/countries`
pub async fn list_countries(
    State(state): State<AppState>,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let view_state = query.into_state()?;
    let view = derive_view(&state.rows, view_state.sort.as_ref(), &view_state.filter);
    let current = view_model::page(&view, view_state.page, state.page_size);

    let body = CountriesPage {
        data: current.rows,
        meta: current.meta,
        sort: view_state.sort,
        filter: &view_state.filter,
    };

    Ok(Json(body).into_response())
}

/// `GET /api/countries/selection`
pub async fn selection(
    State(state): State<AppState>,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> Result<Json<DetailPanel>, AppError> {
    let Query(query) = query?;
    let view_state = query.into_state()?;
    let view = derive_view(&state.rows, view_state.sort.as_ref(), &view_state.filter);

    Ok(Json(detail_panel(&view, view_state.selected)))
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "rows": state.rows.len(),
    }))
}
