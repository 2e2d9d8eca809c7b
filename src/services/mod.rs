pub mod graph;
pub mod matching;
pub mod providers;
pub mod ranking;
pub mod recommendations;
pub mod relations;

pub use graph::{Graph, GraphBuilder};
pub use matching::{compute_matches, score_matches};
pub use providers::{ArtistSource, SpotifyProvider};
pub use ranking::{rank, select_top, PageRankConfig};
pub use recommendations::{load_selection, RecommendationEngine};
pub use relations::{FetchContext, RelationFetcher};
