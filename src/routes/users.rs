use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult, models::StoredSelection, routes::AppState, services::load_selection,
};

/// Stored seed set and computed set of one user
pub async fn get_artists(
    State(state): State<Arc<AppState>>,
    Path(spotify_user_id): Path<String>,
) -> AppResult<Json<StoredSelection>> {
    let selection = load_selection(state.store.as_ref(), &spotify_user_id).await?;
    Ok(Json(selection))
}
