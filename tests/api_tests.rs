use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use affinity_engine::{
    db::MemoryStore,
    error::{AppError, AppResult},
    models::Artist,
    routes::{create_router, AppState},
    services::{ArtistSource, RecommendationEngine},
};

/// Artist source answering from fixed tables and counting every call
#[derive(Default)]
struct ScriptedSource {
    related: HashMap<String, Vec<String>>,
    failing_related: Vec<String>,
    genres: HashMap<String, Vec<String>>,
    genre_results: HashMap<String, Vec<String>>,
    top: Vec<String>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn with_related(mut self, id: &str, related: &[&str]) -> Self {
        self.related
            .insert(id.to_string(), related.iter().map(|s| s.to_string()).collect());
        self
    }

    fn with_failing_related(mut self, id: &str) -> Self {
        self.failing_related.push(id.to_string());
        self
    }

    fn with_genre(mut self, id: &str, genre: &str, results: &[&str]) -> Self {
        self.genres.insert(id.to_string(), vec![genre.to_string()]);
        self.genre_results
            .insert(genre.to_string(), results.iter().map(|s| s.to_string()).collect());
        self
    }

    fn artist(&self, id: &str) -> Artist {
        Artist {
            id: id.to_string(),
            name: format!("Artist {}", id),
            image_url: None,
            genres: self.genres.get(id).cloned().unwrap_or_default(),
        }
    }

    fn artists(&self, ids: &[String]) -> Vec<Artist> {
        ids.iter().map(|id| self.artist(id)).collect()
    }
}

#[async_trait::async_trait]
impl ArtistSource for ScriptedSource {
    async fn get_artist(&self, _token: &str, artist_id: &str) -> AppResult<Option<Artist>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.artist(artist_id)))
    }

    async fn get_related_artists(&self, _token: &str, artist_id: &str) -> AppResult<Vec<Artist>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_related.iter().any(|id| id == artist_id) {
            return Err(AppError::ExternalApi("404 page not found".to_string()));
        }
        Ok(self
            .related
            .get(artist_id)
            .map(|ids| self.artists(ids))
            .unwrap_or_default())
    }

    async fn search_artists_by_genre(
        &self,
        _token: &str,
        genre: &str,
        exclude_id: &str,
        limit: usize,
    ) -> AppResult<Vec<Artist>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let found = self.genre_results.get(genre).cloned().unwrap_or_default();
        Ok(self
            .artists(&found)
            .into_iter()
            .filter(|a| a.id != exclude_id)
            .take(limit)
            .collect())
    }

    async fn get_top_artists(&self, _token: &str) -> AppResult<Vec<Artist>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.artists(&self.top))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct TestApp {
    server: TestServer,
    store: MemoryStore,
    source: Arc<ScriptedSource>,
}

async fn create_test_app(source: ScriptedSource, users: &[&str]) -> TestApp {
    let store = MemoryStore::new();
    for user in users {
        store.insert_user(user, user).await;
    }

    let source = Arc::new(source);
    let state = AppState::new(
        Arc::new(store.clone()),
        source.clone(),
        RecommendationEngine::default(),
    );
    let server = TestServer::new(create_router(Arc::new(state))).unwrap();

    TestApp {
        server,
        store,
        source,
    }
}

fn recommendation_body(user: &str, seeds: &[&str]) -> Value {
    json!({
        "spotify_user_id": user,
        "access_token": "test-token",
        "seed_artist_ids": seeds,
    })
}

fn recommended_ids(body: &Value) -> Vec<String> {
    body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["artist_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(ScriptedSource::default(), &[]).await;
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_star_graph_recommends_both_leaves() {
    let source = ScriptedSource::default().with_related("A", &["B", "C"]);
    let app = create_test_app(source, &["alice"]).await;

    let response = app
        .server
        .post("/api/v1/recommendations")
        .json(&recommendation_body("alice", &["A"]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(recommended_ids(&body), vec!["B", "C"]);
    assert_eq!(body["recommendations"][0]["score"], body["recommendations"][1]["score"]);
    assert_eq!(body["recommendations"][0]["display_name"], "Artist B");
    assert_eq!(body["graph"], json!({ "nodes": 3, "edges": 2 }));
}

#[tokio::test]
async fn test_shared_neighbour_ranks_first() {
    let source = ScriptedSource::default()
        .with_related("A", &["X", "Y"])
        .with_related("B", &["X", "Z"]);
    let app = create_test_app(source, &["alice"]).await;

    let response = app
        .server
        .post("/api/v1/recommendations")
        .json(&recommendation_body("alice", &["A", "B"]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let ids = recommended_ids(&body);
    assert_eq!(ids[0], "X");
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&"A".to_string()));
    assert!(!ids.contains(&"B".to_string()));
}

#[tokio::test]
async fn test_seed_without_relations_gives_empty_result() {
    let app = create_test_app(ScriptedSource::default(), &["alice"]).await;

    let response = app
        .server
        .post("/api/v1/recommendations")
        .json(&recommendation_body("alice", &["Z"]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(recommended_ids(&body).is_empty());
    assert_eq!(body["graph"], json!({ "nodes": 1, "edges": 0 }));
}

#[tokio::test]
async fn test_genre_fallback_when_related_lookup_fails() {
    let source = ScriptedSource::default()
        .with_failing_related("A")
        .with_genre("A", "city pop", &["A", "D"]);
    let app = create_test_app(source, &["alice"]).await;

    let response = app
        .server
        .post("/api/v1/recommendations")
        .json(&recommendation_body("alice", &["A"]))
        .await;

    response.assert_status_ok();
    assert_eq!(recommended_ids(&response.json()), vec!["D"]);
}

#[tokio::test]
async fn test_too_many_seeds_rejected_without_fetching() {
    let source = ScriptedSource::default().with_related("a", &["b"]);
    let app = create_test_app(source, &["alice"]).await;

    let response = app
        .server
        .post("/api/v1/recommendations")
        .json(&recommendation_body("alice", &["a", "b", "c", "d"]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
    assert_eq!(app.source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = create_test_app(ScriptedSource::default(), &[]).await;

    let response = app
        .server
        .post("/api/v1/recommendations")
        .json(&recommendation_body("ghost", &["A"]))
        .await;
    response.assert_status_not_found();

    let response = app.server.get("/api/v1/users/ghost/artists").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_stored_selection_after_recommendation() {
    let source = ScriptedSource::default().with_related("A", &["B", "C"]);
    let app = create_test_app(source, &["alice"]).await;

    app.server
        .post("/api/v1/recommendations")
        .json(&recommendation_body("alice", &["A"]))
        .await
        .assert_status_ok();

    let response = app.server.get("/api/v1/users/alice/artists").await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["selected_artists"][0]["artist_id"], "A");
    assert_eq!(body["selected_artists"][0]["kind"], "seed");
    assert_eq!(body["calculated_artists"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_matches_by_shared_seeds() {
    let source = ScriptedSource::default();
    let app = create_test_app(source, &["alice", "bob", "carol"]).await;

    for (user, seeds) in [
        ("alice", vec!["X", "Y"]),
        ("bob", vec!["Y", "Z"]),
        ("carol", vec!["Q"]),
    ] {
        app.server
            .post("/api/v1/recommendations")
            .json(&recommendation_body(user, &seeds))
            .await
            .assert_status_ok();
    }

    let response = app
        .server
        .post("/api/v1/matches")
        .json(&json!({ "spotify_user_id": "alice" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["score"], 1);
    assert_eq!(matches[0]["shared_artists"], json!(["Y"]));
    assert_eq!(matches[0]["profile"]["nickname"], "bob");

    let bob = app.store.insert_user("bob", "bob").await;
    assert_eq!(matches[0]["matched_user_id"], bob.to_string());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app(ScriptedSource::default(), &[]).await;

    let response = app
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-42"),
        )
        .await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-42");

    let response = app.server.get("/health").await;
    assert!(response.headers().get("x-request-id").is_some());
}
