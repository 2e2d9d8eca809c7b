use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::{
    error::{AppError, AppResult},
    models::{Artist, ArtistKind, ArtistNode},
    services::providers::ArtistSource,
};

/// Most related artists kept per fetched node
pub const RELATED_LIMIT: usize = 10;

/// Outcome of one source call as remembered by the cache; failures keep their message
type Cached<T> = Result<T, String>;

/// Artist metadata memoized for the lifetime of one request
///
/// Created by the request handler, handed to the graph builder through
/// `FetchContext` and dropped with it. Failed lookups are remembered too, so a
/// request never repeats a call that already failed.
#[derive(Default)]
pub struct ArtistCache {
    artists: Mutex<HashMap<String, Cached<Option<Artist>>>>,
    top_artists: OnceCell<Cached<Vec<Artist>>>,
}

impl ArtistCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn cached_artist_count(&self) -> usize {
        self.artists.lock().await.len()
    }
}

/// Everything a relation lookup needs: the source, the caller's token, the request cache
#[derive(Clone)]
pub struct FetchContext {
    source: Arc<dyn ArtistSource>,
    token: Arc<str>,
    cache: Arc<ArtistCache>,
}

impl FetchContext {
    pub fn new(source: Arc<dyn ArtistSource>, token: &str) -> Self {
        Self {
            source,
            token: Arc::from(token),
            cache: Arc::new(ArtistCache::new()),
        }
    }

    pub fn source(&self) -> &dyn ArtistSource {
        self.source.as_ref()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn cache(&self) -> &ArtistCache {
        &self.cache
    }

    /// Artist metadata, requested from the source at most once per request
    pub async fn artist(&self, artist_id: &str) -> AppResult<Option<Artist>> {
        if let Some(hit) = self.cache.artists.lock().await.get(artist_id) {
            return hit.clone().map_err(AppError::ExternalApi);
        }

        let fetched = self.source.get_artist(&self.token, artist_id).await;
        let entry = match &fetched {
            Ok(artist) => Ok(artist.clone()),
            Err(e) => Err(e.to_string()),
        };
        self.cache
            .artists
            .lock()
            .await
            .insert(artist_id.to_string(), entry);
        fetched
    }

    /// The requester's top artists, requested from the source at most once per request
    pub async fn top_artists(&self) -> AppResult<&[Artist]> {
        let cached = self
            .cache
            .top_artists
            .get_or_init(|| async {
                self.source
                    .get_top_artists(&self.token)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await;

        match cached {
            Ok(artists) => Ok(artists.as_slice()),
            Err(message) => Err(AppError::ExternalApi(message.clone())),
        }
    }
}

/// One rung of the fallback ladder
#[async_trait::async_trait]
pub trait RelationStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Candidate neighbours of `artist_id`; may be empty
    async fn related(
        &self,
        ctx: &FetchContext,
        artist_id: &str,
        limit: usize,
    ) -> AppResult<Vec<Artist>>;
}

/// The source's own related-artists list
pub struct DirectRelations;

#[async_trait::async_trait]
impl RelationStrategy for DirectRelations {
    fn name(&self) -> &'static str {
        "related_artists"
    }

    async fn related(
        &self,
        ctx: &FetchContext,
        artist_id: &str,
        _limit: usize,
    ) -> AppResult<Vec<Artist>> {
        ctx.source()
            .get_related_artists(ctx.token(), artist_id)
            .await
    }
}

/// Artists sharing the primary genre of `artist_id`
pub struct GenreNeighbors;

#[async_trait::async_trait]
impl RelationStrategy for GenreNeighbors {
    fn name(&self) -> &'static str {
        "genre_search"
    }

    async fn related(
        &self,
        ctx: &FetchContext,
        artist_id: &str,
        limit: usize,
    ) -> AppResult<Vec<Artist>> {
        let Some(artist) = ctx.artist(artist_id).await? else {
            return Ok(Vec::new());
        };
        let Some(genre) = artist.primary_genre() else {
            tracing::debug!(artist_id = %artist_id, "No genre tag to search by");
            return Ok(Vec::new());
        };

        ctx.source()
            .search_artists_by_genre(ctx.token(), genre, artist_id, limit)
            .await
    }
}

/// The requester's own top artists
pub struct AffinityFallback;

#[async_trait::async_trait]
impl RelationStrategy for AffinityFallback {
    fn name(&self) -> &'static str {
        "top_artists"
    }

    async fn related(
        &self,
        ctx: &FetchContext,
        artist_id: &str,
        limit: usize,
    ) -> AppResult<Vec<Artist>> {
        Ok(ctx
            .top_artists()
            .await?
            .iter()
            .filter(|artist| artist.id != artist_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Related-artist lookup with an ordered fallback ladder
///
/// Strategies are tried in order; the first one yielding at least one usable
/// artist wins. Errors count as "no result" and move on to the next rung.
pub struct RelationFetcher {
    strategies: Vec<Box<dyn RelationStrategy>>,
    limit: usize,
}

impl Default for RelationFetcher {
    fn default() -> Self {
        let ladder: Vec<Box<dyn RelationStrategy>> = vec![
            Box::new(DirectRelations),
            Box::new(GenreNeighbors),
            Box::new(AffinityFallback),
        ];
        Self::with_strategies(ladder, RELATED_LIMIT)
    }
}

impl RelationFetcher {
    pub fn with_strategies(strategies: Vec<Box<dyn RelationStrategy>>, limit: usize) -> Self {
        Self { strategies, limit }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Related artists of `artist_id` as `related` nodes; empty once every rung is exhausted
    pub async fn fetch_related(&self, ctx: &FetchContext, artist_id: &str) -> Vec<ArtistNode> {
        for strategy in &self.strategies {
            match strategy.related(ctx, artist_id, self.limit).await {
                Ok(artists) => {
                    let usable = usable_nodes(artists, artist_id, self.limit);
                    if !usable.is_empty() {
                        tracing::debug!(
                            artist_id = %artist_id,
                            strategy = strategy.name(),
                            results = usable.len(),
                            "Related artists resolved"
                        );
                        return usable;
                    }
                    tracing::debug!(
                        artist_id = %artist_id,
                        strategy = strategy.name(),
                        "Strategy returned no related artists"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        artist_id = %artist_id,
                        strategy = strategy.name(),
                        error = %e,
                        "Relation strategy failed, falling back"
                    );
                }
            }
        }

        tracing::warn!(artist_id = %artist_id, "All relation strategies exhausted");
        Vec::new()
    }
}

/// Drops self references, blank and repeated ids, then caps the list
fn usable_nodes(artists: Vec<Artist>, artist_id: &str, limit: usize) -> Vec<ArtistNode> {
    let mut seen = HashSet::new();
    artists
        .into_iter()
        .filter(|artist| !artist.id.trim().is_empty() && artist.id != artist_id)
        .filter(|artist| seen.insert(artist.id.clone()))
        .take(limit)
        .map(|artist| artist.to_node(ArtistKind::Related))
        .collect()
}
