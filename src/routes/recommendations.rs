use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
};

/// Handler for the recommendations endpoint
///
/// Replaces the caller's seed set and returns the new computed set.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        spotify_user_id = %request.spotify_user_id,
        seed_count = request.seed_artist_ids.len(),
        "Processing recommendation request"
    );

    let response = state
        .engine
        .compute_recommendations(state.store.as_ref(), Arc::clone(&state.source), request)
        .await?;

    tracing::info!(
        request_id = %request_id,
        recommended = response.recommendations.len(),
        "Recommendation completed"
    );

    Ok(Json(response))
}
