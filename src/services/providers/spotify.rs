/// Spotify Web API provider
///
/// Endpoints used:
/// 1. Artist metadata: /artists/{id}
/// 2. Related artists: /artists/{id}/related-artists
/// 3. Genre search: /search?type=artist&q=genre:"..."
/// 4. Top artists of the token owner: /me/top/artists
///
/// A 404 on the first two is a normal answer (unknown artist, or a catalog
/// entry without relations) and maps to `None` / empty.
use crate::{
    db::ApiQuota,
    error::{AppError, AppResult},
    models::{ApiArtist, ApiArtistSearch, ApiPage, ApiRelatedArtists, Artist},
    services::providers::ArtistSource,
};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};

const PROVIDER_NAME: &str = "spotify";
const MAX_PAGE_SIZE: usize = 50;
const TOP_ARTISTS_TIME_RANGE: &str = "medium_term";

#[derive(Clone)]
pub struct SpotifyProvider {
    http_client: HttpClient,
    api_url: String,
    quota: Option<ApiQuota>,
}

impl SpotifyProvider {
    pub fn new(api_url: String, quota: Option<ApiQuota>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            quota,
        }
    }

    /// Search query selecting artists tagged with a genre
    fn genre_query(genre: &str) -> String {
        format!("genre:\"{}\"", genre.replace('"', ""))
    }

    /// Page size to request so that `limit` results survive excluding one id
    fn search_page_size(limit: usize) -> usize {
        (limit + 1).clamp(1, MAX_PAGE_SIZE)
    }

    /// Sends an authorized request after claiming a slot from the quota
    ///
    /// Only an exhausted quota refuses the call; bookkeeping failures are logged.
    async fn send(&self, request: RequestBuilder, token: &str) -> AppResult<Response> {
        if let Some(quota) = &self.quota {
            match quota.reserve().await {
                Err(e @ AppError::QuotaExceeded(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, provider = PROVIDER_NAME, "Failed to record API usage");
                }
                Ok(()) => {}
            }
        }

        Ok(request.bearer_auth(token).send().await?)
    }

    /// Turns a non-success status into an `ExternalApi` error
    async fn ensure_success(response: Response) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = %status,
            body = %body,
            provider = PROVIDER_NAME,
            "External API request failed"
        );
        Err(AppError::ExternalApi(format!(
            "API returned status {}: {}",
            status, body
        )))
    }
}

/// Keeps the first `limit` artists that are not `exclude_id`
fn exclude_and_truncate(artists: Vec<ApiArtist>, exclude_id: &str, limit: usize) -> Vec<Artist> {
    artists
        .into_iter()
        .filter(|artist| artist.id != exclude_id)
        .take(limit)
        .map(Artist::from)
        .collect()
}

#[async_trait::async_trait]
impl ArtistSource for SpotifyProvider {
    async fn get_artist(&self, token: &str, artist_id: &str) -> AppResult<Option<Artist>> {
        let url = format!("{}/artists/{}", self.api_url, artist_id);
        let response = self.send(self.http_client.get(&url), token).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(artist_id = %artist_id, provider = PROVIDER_NAME, "Artist not found");
            return Ok(None);
        }

        let artist: ApiArtist = Self::ensure_success(response).await?.json().await?;
        Ok(Some(artist.into()))
    }

    async fn get_related_artists(&self, token: &str, artist_id: &str) -> AppResult<Vec<Artist>> {
        let url = format!("{}/artists/{}/related-artists", self.api_url, artist_id);
        let response = self.send(self.http_client.get(&url), token).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let related: ApiRelatedArtists = Self::ensure_success(response).await?.json().await?;
        let artists = exclude_and_truncate(related.artists, artist_id, usize::MAX);

        tracing::debug!(
            artist_id = %artist_id,
            results = artists.len(),
            provider = PROVIDER_NAME,
            "Related artists fetched"
        );

        Ok(artists)
    }

    async fn search_artists_by_genre(
        &self,
        token: &str,
        genre: &str,
        exclude_id: &str,
        limit: usize,
    ) -> AppResult<Vec<Artist>> {
        if genre.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.api_url);
        let page_size = Self::search_page_size(limit).to_string();
        let request = self.http_client.get(&url).query(&[
            ("q", Self::genre_query(genre).as_str()),
            ("type", "artist"),
            ("limit", page_size.as_str()),
        ]);

        let response = Self::ensure_success(self.send(request, token).await?).await?;
        let search: ApiArtistSearch = response.json().await?;
        let artists = exclude_and_truncate(search.artists.items, exclude_id, limit);

        tracing::debug!(
            genre = %genre,
            results = artists.len(),
            provider = PROVIDER_NAME,
            "Genre search completed"
        );

        Ok(artists)
    }

    async fn get_top_artists(&self, token: &str) -> AppResult<Vec<Artist>> {
        let url = format!("{}/me/top/artists", self.api_url);
        let page_size = MAX_PAGE_SIZE.to_string();
        let request = self.http_client.get(&url).query(&[
            ("limit", page_size.as_str()),
            ("time_range", TOP_ARTISTS_TIME_RANGE),
        ]);

        let response = Self::ensure_success(self.send(request, token).await?).await?;
        let page: ApiPage<ApiArtist> = response.json().await?;

        Ok(page.items.into_iter().map(Artist::from).collect())
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
