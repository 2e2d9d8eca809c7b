use serde::{Deserialize, Serialize};

pub mod artist;
pub mod matching;

pub use artist::{
    ApiArtist, ApiArtistSearch, ApiImage, ApiPage, ApiRelatedArtists, Artist, ArtistKind,
    ArtistNode, RankedArtist,
};
pub use matching::{MatchCandidate, UserId, UserProfile};

/// Request to compute recommendations from a fresh seed set
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    /// Spotify user id of the requester
    pub spotify_user_id: String,
    /// Bearer token forwarded to the relation source
    pub access_token: String,
    /// One to three seed artist ids, in the user's chosen order
    pub seed_artist_ids: Vec<String>,
}

/// Size of the graph a recommendation was computed from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    /// At most five artists, highest score first; empty is a valid outcome
    pub recommendations: Vec<RankedArtist>,
    pub graph: GraphStats,
}

/// The latest saved seed set and computed set of one user
#[derive(Debug, Clone, Serialize)]
pub struct StoredSelection {
    pub selected_artists: Vec<ArtistNode>,
    pub calculated_artists: Vec<RankedArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub spotify_user_id: String,
}

/// One entry of the match list returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub matched_user_id: UserId,
    pub score: usize,
    pub shared_artists: Vec<String>,
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_recommendation_request_deserialize() {
        let json = r#"{
            "spotify_user_id": "listener42",
            "access_token": "BQD...",
            "seed_artist_ids": ["a", "b"]
        }"#;
        let request: RecommendationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.spotify_user_id, "listener42");
        assert_eq!(request.seed_artist_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_match_result_hides_internal_profile_id() {
        let user_id = Uuid::new_v4();
        let result = MatchResult {
            matched_user_id: user_id,
            score: 2,
            shared_artists: vec!["x".to_string(), "y".to_string()],
            profile: Some(UserProfile {
                user_id,
                nickname: "mika".to_string(),
                profile_image_url: None,
                bio: Some("shoegaze forever".to_string()),
            }),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["score"], 2);
        assert_eq!(json["profile"]["nickname"], "mika");
        assert!(json["profile"].get("user_id").is_none());
    }
}
