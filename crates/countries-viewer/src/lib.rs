//! Countries Viewer
//!
//! Read-only web view over the countries table: a sortable, filterable,
//! paginated grid on the left and the selected country's flag on the right.
//!
//! The table is read once at startup. Sorting, filtering, paging, and
//! selection are all carried in the query string and resolved by the pure
//! functions in [`view_model`], so any response can be reproduced from its URL.
//!
//! # Routes
//!
//! - `GET /` - HTML page
//! - `GET /api/countries` - current page of the derived view as JSON
//! - `GET /api/countries/selection` - detail pane for `selected` as JSON
//! - `GET /health` - liveness and row count

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod page;
pub mod routes;
pub mod view_model;

use axum::{routing::get, Router};
use countries_common::CountryRow;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

pub use config::Config;
pub use error::AppError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub rows: Arc<[CountryRow]>,
    pub page_size: usize,
}

impl AppState {
    pub fn new(rows: Vec<CountryRow>, page_size: usize) -> Self {
        Self {
            rows: rows.into(),
            page_size,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, cors: &config::CorsConfig) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/countries", get(routes::list_countries))
        .route("/api/countries/selection", get(routes::selection))
        .route("/health", get(routes::health_check))
        .with_state(state)
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}
