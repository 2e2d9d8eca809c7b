use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{MatchRequest, MatchResponse},
    routes::AppState,
    services::compute_matches,
};

/// Handler for the matches endpoint
pub async fn calculate_matches(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<MatchRequest>,
) -> AppResult<Json<MatchResponse>> {
    let response = compute_matches(state.store.as_ref(), &request.spotify_user_id).await?;

    tracing::info!(
        request_id = %request_id,
        spotify_user_id = %request.spotify_user_id,
        matches = response.matches.len(),
        "Match calculation completed"
    );

    Ok(Json(response))
}
