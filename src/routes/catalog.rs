use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{models::CatalogStats, routes::AppState};

/// Handler for catalog statistics
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<CatalogStats> {
    Json(state.index.stats())
}
