use std::collections::{BTreeMap, HashSet};

use crate::{
    db::ArtistStore,
    error::{AppError, AppResult},
    models::{MatchCandidate, MatchResponse, MatchResult, UserId},
};

/// Scores every other user by seed-artist overlap with `self_user_id`
///
/// Only users sharing at least one seed artist are returned, highest score
/// first; equal scores keep the map's (user id) order. `shared_artists`
/// follows the requester's seed order.
pub fn score_matches(
    self_user_id: UserId,
    all_seed_sets: &BTreeMap<UserId, Vec<String>>,
) -> Vec<MatchCandidate> {
    let Some(own_seeds) = all_seed_sets.get(&self_user_id) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let own_seeds: Vec<&String> = own_seeds.iter().filter(|id| seen.insert(*id)).collect();

    let mut candidates: Vec<MatchCandidate> = all_seed_sets
        .iter()
        .filter(|(user_id, _)| **user_id != self_user_id)
        .filter_map(|(user_id, seeds)| {
            let theirs: HashSet<&String> = seeds.iter().collect();
            let shared_artists: Vec<String> = own_seeds
                .iter()
                .filter(|id| theirs.contains(*id))
                .map(|id| id.to_string())
                .collect();

            if shared_artists.is_empty() {
                return None;
            }

            Some(MatchCandidate {
                user_id: *user_id,
                score: shared_artists.len(),
                shared_artists,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}

/// Ranked matches for a user, each with the matched user's public profile
pub async fn compute_matches(
    store: &dyn ArtistStore,
    spotify_user_id: &str,
) -> AppResult<MatchResponse> {
    if spotify_user_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "spotify_user_id cannot be empty".to_string(),
        ));
    }

    let user_id = store
        .find_user_id(spotify_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", spotify_user_id)))?;

    let seed_sets = store.load_seed_sets_for_all_users().await?;
    let candidates = score_matches(user_id, &seed_sets);

    if candidates.is_empty() {
        tracing::info!(user_id = %user_id, "No matching users");
        return Ok(MatchResponse { matches: vec![] });
    }

    let mut profiles = store.load_profiles().await?;
    let matches: Vec<MatchResult> = candidates
        .into_iter()
        .map(|candidate| MatchResult {
            matched_user_id: candidate.user_id,
            score: candidate.score,
            profile: profiles.remove(&candidate.user_id),
            shared_artists: candidate.shared_artists,
        })
        .collect();

    tracing::info!(
        user_id = %user_id,
        candidates = seed_sets.len().saturating_sub(1),
        matches = matches.len(),
        "Matches computed"
    );

    Ok(MatchResponse { matches })
}
