use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::ArtistStore,
    error::AppResult,
    models::{ArtistNode, RankedArtist, UserId, UserProfile},
};

/// In-process `ArtistStore`
///
/// Every write happens under one write lock, so a `replace_selection` is
/// observed either entirely or not at all.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    spotify_ids: HashMap<String, UserId>,
    profiles: HashMap<UserId, UserProfile>,
    seed_sets: BTreeMap<UserId, Vec<ArtistNode>>,
    computed_sets: HashMap<UserId, Vec<RankedArtist>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user, returning the existing id if already known
    pub async fn insert_user(&self, spotify_user_id: &str, nickname: &str) -> UserId {
        let mut inner = self.inner.write().await;
        if let Some(id) = inner.spotify_ids.get(spotify_user_id) {
            return *id;
        }

        let user_id = Uuid::new_v4();
        inner.spotify_ids.insert(spotify_user_id.to_string(), user_id);
        inner.profiles.insert(
            user_id,
            UserProfile {
                user_id,
                nickname: nickname.to_string(),
                profile_image_url: None,
                bio: None,
            },
        );
        user_id
    }
}

#[async_trait::async_trait]
impl ArtistStore for MemoryStore {
    async fn find_user_id(&self, spotify_user_id: &str) -> AppResult<Option<UserId>> {
        let inner = self.inner.read().await;
        Ok(inner.spotify_ids.get(spotify_user_id).copied())
    }

    async fn load_seed_sets_for_all_users(&self) -> AppResult<BTreeMap<UserId, Vec<String>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .seed_sets
            .iter()
            .filter(|(_, seeds)| !seeds.is_empty())
            .map(|(user_id, seeds)| {
                let ids = seeds.iter().map(|s| s.artist_id.clone()).collect();
                (*user_id, ids)
            })
            .collect())
    }

    async fn load_seed_set(&self, user_id: UserId) -> AppResult<Vec<ArtistNode>> {
        let inner = self.inner.read().await;
        Ok(inner.seed_sets.get(&user_id).cloned().unwrap_or_default())
    }

    async fn load_computed_set(&self, user_id: UserId) -> AppResult<Vec<RankedArtist>> {
        let inner = self.inner.read().await;
        let mut computed = inner.computed_sets.get(&user_id).cloned().unwrap_or_default();
        computed.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(computed)
    }

    async fn load_profiles(&self) -> AppResult<HashMap<UserId, UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.clone())
    }

    async fn replace_seed_set(&self, user_id: UserId, seeds: &[ArtistNode]) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.seed_sets.insert(user_id, seeds.to_vec());
        Ok(())
    }

    async fn replace_computed_set(
        &self,
        user_id: UserId,
        computed: &[RankedArtist],
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.computed_sets.insert(user_id, computed.to_vec());
        Ok(())
    }

    async fn replace_selection(
        &self,
        user_id: UserId,
        seeds: &[ArtistNode],
        computed: &[RankedArtist],
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.seed_sets.insert(user_id, seeds.to_vec());
        inner.computed_sets.insert(user_id, computed.to_vec());
        Ok(())
    }
}
