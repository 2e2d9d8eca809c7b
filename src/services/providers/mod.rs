/// Artist relation data sources
///
/// This module provides a pluggable seam for the external catalog the graph is
/// expanded from. The engine only ever talks to `ArtistSource`, so the Spotify
/// client can be swapped for a scripted source in tests.
use crate::{error::AppResult, models::Artist};

pub mod spotify;

pub use spotify::SpotifyProvider;

/// Trait for artist relation providers
///
/// Every call carries the requester's bearer token; providers never store it.
/// An empty result is a legitimate answer and must not be reported as an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ArtistSource: Send + Sync {
    /// Fetch artist metadata, `None` when the id is unknown to the source
    async fn get_artist(&self, token: &str, artist_id: &str) -> AppResult<Option<Artist>>;

    /// Fetch the source's own related-artist list
    async fn get_related_artists(&self, token: &str, artist_id: &str) -> AppResult<Vec<Artist>>;

    /// Search artists tagged with `genre`, never returning `exclude_id`
    async fn search_artists_by_genre(
        &self,
        token: &str,
        genre: &str,
        exclude_id: &str,
        limit: usize,
    ) -> AppResult<Vec<Artist>>;

    /// Fetch the token owner's top artists
    async fn get_top_artists(&self, token: &str) -> AppResult<Vec<Artist>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
