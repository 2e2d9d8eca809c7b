use serde::{Deserialize, Serialize};

/// Role of an artist inside one recommendation graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ArtistKind {
    /// Chosen by the user
    Seed,
    /// Discovered while expanding the graph
    Related,
}

/// A vertex of the recommendation graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtistNode {
    pub artist_id: String,
    pub display_name: String,
    pub image_url: Option<String>,
    pub kind: ArtistKind,
}

impl ArtistNode {
    /// Placeholder node for a seed whose metadata could not be fetched
    pub fn bare_seed(artist_id: impl Into<String>) -> Self {
        let artist_id = artist_id.into();
        Self {
            display_name: artist_id.clone(),
            artist_id,
            image_url: None,
            kind: ArtistKind::Seed,
        }
    }
}

/// Normalized artist returned by the relation source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Artist {
    /// First genre tag, which the source lists most-representative first
    pub fn primary_genre(&self) -> Option<&str> {
        self.genres
            .iter()
            .map(|g| g.trim())
            .find(|g| !g.is_empty())
    }

    pub fn to_node(&self, kind: ArtistKind) -> ArtistNode {
        ArtistNode {
            artist_id: self.id.clone(),
            display_name: self.name.clone(),
            image_url: self.image_url.clone(),
            kind,
        }
    }
}

/// A non-seed artist with its centrality score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedArtist {
    pub artist_id: String,
    pub display_name: String,
    pub image_url: Option<String>,
    pub score: f64,
}

impl RankedArtist {
    pub fn from_node(node: &ArtistNode, score: f64) -> Self {
        Self {
            artist_id: node.artist_id.clone(),
            display_name: node.display_name.clone(),
            image_url: node.image_url.clone(),
            score,
        }
    }
}

// ============================================================================
// Spotify Web API Types
// ============================================================================

/// Artist object as returned by `/artists/{id}` and friends
#[derive(Debug, Clone, Deserialize)]
pub struct ApiArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<ApiImage>,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiImage {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

impl From<ApiArtist> for Artist {
    fn from(api: ApiArtist) -> Self {
        Artist {
            id: api.id,
            name: api.name,
            image_url: api.images.into_iter().next().map(|image| image.url),
            genres: api.genres,
        }
    }
}

/// Response from GET /artists/{id}/related-artists
#[derive(Debug, Deserialize)]
pub struct ApiRelatedArtists {
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
}

/// Response from GET /search?type=artist
#[derive(Debug, Deserialize)]
pub struct ApiArtistSearch {
    pub artists: ApiPage<ApiArtist>,
}

/// Paging object; also the shape of GET /me/top/artists
#[derive(Debug, Deserialize)]
pub struct ApiPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_artist_takes_first_image() {
        let json = r#"{
            "id": "4Z8W4fKeB5YxbusRsdQVPb",
            "name": "Radiohead",
            "images": [
                {"url": "https://i.scdn.co/image/large", "height": 640, "width": 640},
                {"url": "https://i.scdn.co/image/small", "height": 160, "width": 160}
            ],
            "genres": ["alternative rock", "art rock"],
            "popularity": 79
        }"#;

        let api: ApiArtist = serde_json::from_str(json).unwrap();
        let artist = Artist::from(api);

        assert_eq!(artist.id, "4Z8W4fKeB5YxbusRsdQVPb");
        assert_eq!(artist.name, "Radiohead");
        assert_eq!(
            artist.image_url.as_deref(),
            Some("https://i.scdn.co/image/large")
        );
        assert_eq!(artist.primary_genre(), Some("alternative rock"));
    }

    #[test]
    fn test_api_artist_missing_optional_fields() {
        let api: ApiArtist = serde_json::from_str(r#"{"id": "x", "name": "X"}"#).unwrap();
        let artist = Artist::from(api);
        assert_eq!(artist.image_url, None);
        assert_eq!(artist.primary_genre(), None);
    }

    #[test]
    fn test_primary_genre_skips_blank_tags() {
        let artist = Artist {
            id: "a".to_string(),
            name: "A".to_string(),
            image_url: None,
            genres: vec!["  ".to_string(), "shoegaze".to_string()],
        };
        assert_eq!(artist.primary_genre(), Some("shoegaze"));
    }

    #[test]
    fn test_search_response_shape() {
        let json = r#"{"artists": {"items": [{"id": "b", "name": "B"}], "total": 1}}"#;
        let search: ApiArtistSearch = serde_json::from_str(json).unwrap();
        assert_eq!(search.artists.items.len(), 1);
        assert_eq!(search.artists.items[0].id, "b");
    }

    #[test]
    fn test_artist_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ArtistKind::Seed).unwrap(), r#""seed""#);
        assert_eq!(
            serde_json::to_string(&ArtistKind::Related).unwrap(),
            r#""related""#
        );
    }

    #[test]
    fn test_bare_seed_uses_id_as_name() {
        let node = ArtistNode::bare_seed("abc");
        assert_eq!(node.display_name, "abc");
        assert_eq!(node.kind, ArtistKind::Seed);
    }
}
