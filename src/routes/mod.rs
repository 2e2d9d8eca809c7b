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
    db::ArtistStore,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{ArtistSource, RecommendationEngine},
};

pub mod matches;
pub mod recommendations;
pub mod users;

/// Shared handler state
pub struct AppState {
    pub store: Arc<dyn ArtistStore>,
    pub source: Arc<dyn ArtistSource>,
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ArtistStore>,
        source: Arc<dyn ArtistSource>,
        engine: RecommendationEngine,
    ) -> Self {
        Self {
            store,
            source,
            engine: Arc::new(engine),
        }
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
        .route("/users/:spotify_user_id/artists", get(users::get_artists))
        .route("/matches", post(matches::calculate_matches))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
