use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    config::Config,
    db::ArtistStore,
    error::{AppError, AppResult},
    models::{ArtistKind, ArtistNode, RecommendationRequest, RecommendationResponse, StoredSelection},
    services::{
        graph::GraphBuilder,
        providers::ArtistSource,
        ranking::{self, PageRankConfig, DEFAULT_TOP_N},
        relations::{FetchContext, RelationFetcher},
    },
};

pub const MIN_SEEDS: usize = 1;
pub const MAX_SEEDS: usize = 3;

/// Rejects seed lists the engine cannot work with
///
/// Runs before any relation fetch, so a rejected request costs no API calls.
pub fn validate_seed_ids(seed_artist_ids: &[String]) -> AppResult<()> {
    if !(MIN_SEEDS..=MAX_SEEDS).contains(&seed_artist_ids.len()) {
        return Err(AppError::InvalidInput(format!(
            "Expected {} to {} seed artists, got {}",
            MIN_SEEDS,
            MAX_SEEDS,
            seed_artist_ids.len()
        )));
    }

    let mut seen = HashSet::new();
    for artist_id in seed_artist_ids {
        if artist_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Seed artist ids cannot be empty".to_string(),
            ));
        }
        if !seen.insert(artist_id.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Duplicate seed artist id: {}",
                artist_id
            )));
        }
    }

    Ok(())
}

/// Builds, ranks and stores recommendations for one user at a time
pub struct RecommendationEngine {
    builder: GraphBuilder,
    ranking: PageRankConfig,
    top_n: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(GraphBuilder::new(RelationFetcher::default()), PageRankConfig::default())
    }
}

impl RecommendationEngine {
    pub fn new(builder: GraphBuilder, ranking: PageRankConfig) -> Self {
        Self {
            builder,
            ranking,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let builder = GraphBuilder::new(RelationFetcher::default())
            .with_depth(config.expansion_depth)
            .with_max_concurrent_fetches(config.max_concurrent_fetches);

        Self::new(builder, PageRankConfig::with_damping(config.pagerank_damping))
    }

    /// Replaces the user's seed set and returns the freshly computed set
    ///
    /// Nothing is persisted unless the whole pipeline succeeds.
    pub async fn compute_recommendations(
        &self,
        store: &dyn ArtistStore,
        source: Arc<dyn ArtistSource>,
        request: RecommendationRequest,
    ) -> AppResult<RecommendationResponse> {
        validate_seed_ids(&request.seed_artist_ids)?;

        if request.access_token.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "access_token cannot be empty".to_string(),
            ));
        }

        let user_id = store
            .find_user_id(&request.spotify_user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("User {} not found", request.spotify_user_id))
            })?;

        let ctx = FetchContext::new(source, &request.access_token);

        let mut seeds = Vec::with_capacity(request.seed_artist_ids.len());
        for artist_id in &request.seed_artist_ids {
            seeds.push(seed_node(&ctx, artist_id).await);
        }

        let graph = self.builder.build_graph(&ctx, seeds.clone()).await;
        let scores = ranking::rank(&graph, &self.ranking);
        let seed_ids: HashSet<String> = request.seed_artist_ids.iter().cloned().collect();
        let recommendations = ranking::select_top(&graph, &scores, &seed_ids, self.top_n);

        store
            .replace_selection(user_id, &seeds, &recommendations)
            .await?;

        let stats = graph.stats();
        tracing::info!(
            user_id = %user_id,
            source = ctx.source().name(),
            seeds = seeds.len(),
            nodes = stats.nodes,
            edges = stats.edges,
            recommended = recommendations.len(),
            "Recommendations computed"
        );

        Ok(RecommendationResponse {
            recommendations,
            graph: stats,
        })
    }
}

/// Seed node with display attributes when the source knows the artist
async fn seed_node(ctx: &FetchContext, artist_id: &str) -> ArtistNode {
    match ctx.artist(artist_id).await {
        Ok(Some(artist)) => artist.to_node(ArtistKind::Seed),
        Ok(None) => ArtistNode::bare_seed(artist_id),
        Err(e) => {
            tracing::warn!(artist_id, error = %e, "Seed metadata unavailable");
            ArtistNode::bare_seed(artist_id)
        }
    }
}

/// The user's latest seed set and computed set
pub async fn load_selection(
    store: &dyn ArtistStore,
    spotify_user_id: &str,
) -> AppResult<StoredSelection> {
    let user_id = store
        .find_user_id(spotify_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", spotify_user_id)))?;

    let selected_artists = store.load_seed_set(user_id).await?;
    let calculated_artists = store.load_computed_set(user_id).await?;

    Ok(StoredSelection {
        selected_artists,
        calculated_artists,
    })
}
