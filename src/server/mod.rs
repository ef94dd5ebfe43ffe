//! HTTP surface: one axum router per service.
//!
//! ```text
//! rent_roll_router   POST /extracttable     token check ─▶ fetch ─▶ extract ─▶ LLM ─▶ JSON
//! csv_router         POST /extract-tables/  multipart ─▶ temp file ─▶ extract ─▶ merge ─▶ CSV
//! ```
//!
//! Both routers are stateless across requests. The token middleware runs
//! before the JSON body is parsed, so an unauthenticated request never
//! reaches the fetch or the extractor.

pub mod auth;
pub mod error;
pub mod handlers;

use crate::config::ServiceConfig;
use crate::pipeline::extract::TableExtractor;
use crate::pipeline::llm::TextGenerator;
use axum::{extract::DefaultBodyLimit, middleware, routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Path of the rent-roll endpoint.
pub const RENT_ROLL_PATH: &str = "/extracttable";
/// Path of the CSV endpoint.
pub const TABLES_CSV_PATH: &str = "/extract-tables/";

/// Shared state of the rent-roll service.
#[derive(Clone)]
pub struct RentRollState {
    pub config: Arc<ServiceConfig>,
    pub extractor: Arc<dyn TableExtractor>,
    pub generator: Arc<dyn TextGenerator>,
}

impl RentRollState {
    pub fn new(
        config: ServiceConfig,
        extractor: Arc<dyn TableExtractor>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            extractor,
            generator,
        }
    }
}

/// Shared state of the CSV service.
#[derive(Clone)]
pub struct CsvState {
    pub extractor: Arc<dyn TableExtractor>,
}

impl CsvState {
    pub fn new(extractor: Arc<dyn TableExtractor>) -> Self {
        Self { extractor }
    }
}

/// Router for `POST /extracttable`.
pub fn rent_roll_router(state: RentRollState) -> Router {
    Router::new()
        .route(RENT_ROLL_PATH, post(handlers::extract_rent_roll))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_internal_token,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router for `POST /extract-tables/`. Upload size is not limited.
pub fn csv_router(state: CsvState) -> Router {
    Router::new()
        .route(TABLES_CSV_PATH, post(handlers::extract_tables_csv))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
