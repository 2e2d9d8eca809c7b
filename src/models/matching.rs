use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal user identifier
pub type UserId = Uuid;

/// Another user whose seed artists overlap the requester's
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchCandidate {
    pub user_id: UserId,
    /// Size of the seed-set intersection, always > 0
    pub score: usize,
    /// The intersection itself, in the requester's seed order
    pub shared_artists: Vec<String>,
}

/// Public part of a user's profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct UserProfile {
    #[serde(skip_serializing)]
    pub user_id: UserId,
    pub nickname: String,
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
}
