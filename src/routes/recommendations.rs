use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
    services::recommendations,
};

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        genres = ?request.preferred_genres,
        "Processing recommendation request"
    );

    let response = recommendations::get_recommendations(
        &state.index,
        &state.catalog,
        state.cache.as_ref(),
        &state.config,
        request,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        count = response.count,
        "Recommendation request completed"
    );

    Ok(Json(response))
}
