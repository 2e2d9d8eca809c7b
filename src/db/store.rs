use std::collections::{BTreeMap, HashMap};

use crate::{
    error::AppResult,
    models::{ArtistNode, RankedArtist, UserId, UserProfile},
};

/// Persistence boundary for seed sets, computed sets and profiles
///
/// Every `replace_*` call swaps the stored set wholesale. Implementations must
/// make each call atomic: readers see either the previous set or the new one.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ArtistStore: Send + Sync {
    /// Resolves an external Spotify user id to the internal user id
    async fn find_user_id(&self, spotify_user_id: &str) -> AppResult<Option<UserId>>;

    /// Seed artist ids of every user that has saved a seed set
    ///
    /// Users are ordered by id; each list keeps the saved seed order.
    async fn load_seed_sets_for_all_users(&self) -> AppResult<BTreeMap<UserId, Vec<String>>>;

    /// Saved seed set of one user, in saved order
    async fn load_seed_set(&self, user_id: UserId) -> AppResult<Vec<ArtistNode>>;

    /// Saved computed set of one user, highest score first
    async fn load_computed_set(&self, user_id: UserId) -> AppResult<Vec<RankedArtist>>;

    /// Public profiles of all users
    async fn load_profiles(&self) -> AppResult<HashMap<UserId, UserProfile>>;

    async fn replace_seed_set(&self, user_id: UserId, seeds: &[ArtistNode]) -> AppResult<()>;

    async fn replace_computed_set(&self, user_id: UserId, computed: &[RankedArtist])
        -> AppResult<()>;

    /// Replaces the seed set and the computed set together, in one transaction
    async fn replace_selection(
        &self,
        user_id: UserId,
        seeds: &[ArtistNode],
        computed: &[RankedArtist],
    ) -> AppResult<()>;
}
