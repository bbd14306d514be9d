use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    db::Cache,
    error::AppResult,
    middleware::{make_span_with_request_id, request_id_middleware},
    models::CatalogItem,
    services::CatalogIndex,
};

pub mod catalog;
pub mod recommendations;

/// Shared, read-only application state
pub struct AppState {
    pub config: Config,
    pub catalog: Vec<CatalogItem>,
    pub index: CatalogIndex,
    pub cache: Option<Cache>,
}

impl AppState {
    /// Indexes the catalog once; fails on an empty catalog
    pub fn new(config: Config, catalog: Vec<CatalogItem>, cache: Option<Cache>) -> AppResult<Self> {
        let index = CatalogIndex::build(&catalog)?;
        Ok(Self {
            config,
            catalog,
            index,
            cache,
        })
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/catalog", get(catalog::stats))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
