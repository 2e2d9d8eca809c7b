use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::{
    models::{ArtistKind, ArtistNode, GraphStats},
    services::relations::{FetchContext, RelationFetcher},
};

/// Every edge carries the same weight; relation rank is not used
pub const EDGE_WEIGHT: f64 = 1.0;

/// Undirected edge between two artists
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Undirected affinity graph of artists
///
/// Nodes are indexed in discovery order, which the ranking uses to break
/// ties. There are no self-loops and at most one edge per pair of nodes.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<ArtistNode>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    edge_set: HashSet<(usize, usize)>,
    edge_order: Vec<(usize, usize)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node unless its id is already present; the first occurrence wins
    pub fn add_node(&mut self, node: ArtistNode) -> bool {
        if self.index.contains_key(&node.artist_id) {
            return false;
        }

        self.index.insert(node.artist_id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        true
    }

    /// Connects two present, distinct nodes; no-op for self-loops, unknown ids and duplicates
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            return false;
        };
        if ia == ib {
            return false;
        }

        let key = (ia.min(ib), ia.max(ib));
        if !self.edge_set.insert(key) {
            return false;
        }

        self.edge_order.push(key);
        self.adjacency[ia].push(ib);
        self.adjacency[ib].push(ia);
        true
    }

    pub fn contains_node(&self, artist_id: &str) -> bool {
        self.index.contains_key(artist_id)
    }

    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.edge_set.contains(&(ia.min(ib), ia.max(ib))),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in discovery order
    pub fn nodes(&self) -> &[ArtistNode] {
        &self.nodes
    }

    pub fn node(&self, artist_id: &str) -> Option<&ArtistNode> {
        self.index.get(artist_id).map(|&i| &self.nodes[i])
    }

    pub fn index_of(&self, artist_id: &str) -> Option<usize> {
        self.index.get(artist_id).copied()
    }

    /// Neighbour indices of the node at `index`
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.adjacency[index]
    }

    pub fn degree(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> Vec<Edge> {
        self.edge_order
            .iter()
            .map(|&(a, b)| Edge {
                source: self.nodes[a].artist_id.clone(),
                target: self.nodes[b].artist_id.clone(),
                weight: EDGE_WEIGHT,
            })
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
        }
    }
}

/// Expands a seed set into a `Graph` by breadth-first relation lookups
pub struct GraphBuilder {
    fetcher: Arc<RelationFetcher>,
    depth: usize,
    max_concurrent_fetches: usize,
}

impl GraphBuilder {
    pub fn new(fetcher: RelationFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            depth: 1,
            max_concurrent_fetches: 3,
        }
    }

    /// Number of hops from the seeds; 1 expands the seeds only
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth.max(1);
        self
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    /// Builds the graph for one request
    ///
    /// Seeds become `seed` nodes even when nothing is found for them. Results
    /// of one hop are merged in frontier order, so node discovery order does
    /// not depend on which fetch finishes first.
    pub async fn build_graph(&self, ctx: &FetchContext, seeds: Vec<ArtistNode>) -> Graph {
        let mut graph = Graph::new();
        let mut frontier = Vec::new();

        for seed in seeds {
            let artist_id = seed.artist_id.clone();
            let seed = ArtistNode {
                kind: ArtistKind::Seed,
                ..seed
            };
            if graph.add_node(seed) {
                frontier.push(artist_id);
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));

        for hop in 1..=self.depth {
            if frontier.is_empty() {
                break;
            }

            let fetched = self.fetch_frontier(ctx, &frontier, &semaphore).await;
            let mut next_frontier = Vec::new();

            for (origin, related) in frontier.iter().zip(fetched) {
                for node in related {
                    let artist_id = node.artist_id.clone();
                    if graph.add_node(node) {
                        next_frontier.push(artist_id.clone());
                    }
                    graph.add_edge(origin, &artist_id);
                }
            }

            tracing::debug!(
                hop,
                expanded = frontier.len(),
                discovered = next_frontier.len(),
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "Graph expansion hop completed"
            );

            frontier = next_frontier;
        }

        graph
    }

    /// Fetches relations for every frontier node, results in frontier order
    ///
    /// Tasks live in a `JoinSet`, so dropping this future aborts them.
    async fn fetch_frontier(
        &self,
        ctx: &FetchContext,
        frontier: &[String],
        semaphore: &Arc<Semaphore>,
    ) -> Vec<Vec<ArtistNode>> {
        let mut tasks = JoinSet::new();

        for (position, artist_id) in frontier.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let ctx = ctx.clone();
            let semaphore = Arc::clone(semaphore);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let related = fetcher.fetch_related(&ctx, &artist_id).await;
                (position, related)
            });
        }

        let mut results = vec![Vec::new(); frontier.len()];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, related)) => results[position] = related,
                Err(e) => {
                    tracing::error!(error = %e, "Relation fetch task failed");
                }
            }
        }

        results
    }
}
