use std::collections::{HashMap, HashSet};

use crate::{models::RankedArtist, services::graph::Graph};

/// Size of the computed set
pub const DEFAULT_TOP_N: usize = 5;

/// PageRank parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankConfig {
    /// Probability of following an edge rather than teleporting
    pub damping: f64,
    /// Iteration cap
    pub max_iterations: usize,
    /// Convergence threshold on the L1 change between iterations
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }
}

impl PageRankConfig {
    pub fn with_damping(damping: f64) -> Self {
        Self {
            damping,
            ..Self::default()
        }
    }
}

/// PageRank scores indexed like `graph.nodes()`
///
/// Edges are undirected, so a node's out-degree is its degree. Isolated nodes
/// pass no mass on and keep only the teleport share. The result is normalized
/// to sum to 1.
pub fn pagerank_scores(graph: &Graph, config: &PageRankConfig) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let d = config.damping;
    let teleport = (1.0 - d) / n as f64;
    let mut scores = vec![1.0 / n as f64; n];
    let mut next = vec![0.0; n];

    for iteration in 0..config.max_iterations {
        for (v, slot) in next.iter_mut().enumerate() {
            let incoming: f64 = graph
                .neighbors(v)
                .iter()
                .map(|&u| scores[u] / graph.degree(u) as f64)
                .sum();
            *slot = teleport + d * incoming;
        }

        let delta: f64 = scores
            .iter()
            .zip(next.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut scores, &mut next);

        if delta < config.tolerance {
            tracing::trace!(iterations = iteration + 1, "PageRank converged");
            break;
        }
    }

    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        scores.iter_mut().for_each(|s| *s /= total);
    }

    scores
}

/// PageRank score per artist id; empty for an empty graph
pub fn rank(graph: &Graph, config: &PageRankConfig) -> HashMap<String, f64> {
    graph
        .nodes()
        .iter()
        .zip(pagerank_scores(graph, config))
        .map(|(node, score)| (node.artist_id.clone(), score))
        .collect()
}

/// Highest-scoring non-seed artists, at most `n`
///
/// Equal scores keep discovery order.
pub fn select_top(
    graph: &Graph,
    scores: &HashMap<String, f64>,
    seed_ids: &HashSet<String>,
    n: usize,
) -> Vec<RankedArtist> {
    let mut candidates: Vec<RankedArtist> = graph
        .nodes()
        .iter()
        .filter(|node| !seed_ids.contains(&node.artist_id))
        .map(|node| {
            let score = scores.get(&node.artist_id).copied().unwrap_or(0.0);
            RankedArtist::from_node(node, score)
        })
        .collect();

    // sort_by is stable
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(n);
    candidates
}
