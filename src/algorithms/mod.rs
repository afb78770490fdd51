//! Native graph-algorithm operators. Each is a pure function over a
//! [`CsrGraph`](crate::csr::CsrGraph) producing a JSON-encoded result, grounded
//! on the corresponding `graph_algo_*.c` file in
//! `examples/original_source/src/backend/executor/`.

mod betweenness;
mod closeness;
mod components;
mod degree;
mod eigenvector;
mod label_propagation;
mod louvain;
mod pagerank;
mod paths;
mod similarity;
mod triangle;

use rusqlite::Connection;

use crate::csr::{self, CsrGraph};
use crate::error::GraphliteResult;

/// An algorithm plan descriptor: the id plus parsed, bounds-checked
/// parameters (§4.4's "algorithm detection"). Built by `transform`, consumed
/// by [`run`].
#[derive(Debug, Clone, PartialEq)]
pub enum AlgorithmCall {
    PageRank { damping: f64, max_iterations: u32 },
    TopPageRank { k: usize, damping: f64, max_iterations: u32 },
    PersonalizedPageRank { seeds: Vec<String>, damping: f64, max_iterations: u32 },
    LabelPropagation,
    Louvain { resolution: f64 },
    Wcc,
    Scc,
    BetweennessCentrality,
    ClosenessCentrality,
    EigenvectorCentrality,
    DegreeCentrality,
    Dijkstra { source: String, target: String, weight_prop: Option<String> },
    AStar { source: String, target: String, weight_prop: Option<String> },
    Apsp,
    Bfs { source: String, max_depth: Option<i64> },
    Dfs { source: String, max_depth: Option<i64> },
    TriangleCount,
    NodeSimilarity { pair: Option<(String, String)>, threshold: Option<f64>, top_k: Option<usize> },
    Knn { source: String, k: usize },
}

impl AlgorithmCall {
    /// The function name as it appears in a RETURN clause, for detection in
    /// `transform::algorithm_detect`.
    pub fn function_name(&self) -> &'static str {
        match self {
            AlgorithmCall::PageRank { .. } => "pageRank",
            AlgorithmCall::TopPageRank { .. } => "topPageRank",
            AlgorithmCall::PersonalizedPageRank { .. } => "personalizedPageRank",
            AlgorithmCall::LabelPropagation => "labelPropagation",
            AlgorithmCall::Louvain { .. } => "louvain",
            AlgorithmCall::Wcc => "wcc",
            AlgorithmCall::Scc => "scc",
            AlgorithmCall::BetweennessCentrality => "betweennessCentrality",
            AlgorithmCall::ClosenessCentrality => "closenessCentrality",
            AlgorithmCall::EigenvectorCentrality => "eigenvectorCentrality",
            AlgorithmCall::DegreeCentrality => "degreeCentrality",
            AlgorithmCall::Dijkstra { .. } => "dijkstra",
            AlgorithmCall::AStar { .. } => "astar",
            AlgorithmCall::Apsp => "apsp",
            AlgorithmCall::Bfs { .. } => "bfs",
            AlgorithmCall::Dfs { .. } => "dfs",
            AlgorithmCall::TriangleCount => "triangleCount",
            AlgorithmCall::NodeSimilarity { .. } => "nodeSimilarity",
            AlgorithmCall::Knn { .. } => "knn",
        }
    }
}

/// Names recognised by algorithm detection. Anything else falls through to
/// the SQL path as a user-defined function call.
pub const KNOWN_FUNCTIONS: &[&str] = &[
    "pagerank",
    "toppagerank",
    "personalizedpagerank",
    "labelpropagation",
    "louvain",
    "wcc",
    "scc",
    "betweennesscentrality",
    "closenesscentrality",
    "eigenvectorcentrality",
    "degreecentrality",
    "dijkstra",
    "astar",
    "apsp",
    "allpairsshortestpath",
    "bfs",
    "dfs",
    "trianglecount",
    "nodesimilarity",
    "knn",
];

pub fn is_known_algorithm_function(name: &str) -> bool {
    KNOWN_FUNCTIONS.contains(&name.to_ascii_lowercase().as_str())
}

/// Clamp iteration counts into `[1, 100]` per §4.4.
pub fn clamp_iterations(v: u32) -> u32 {
    v.clamp(1, 100)
}

/// Clamp top-k parameters into `[1, 1000]` per §4.4.
pub fn clamp_top_k(v: usize) -> usize {
    v.clamp(1, 1000)
}

/// Run an algorithm call against the current graph state. `"[]"` for a null
/// (empty) CSR snapshot — or the algorithm-specific empty-success shape for
/// path queries — per §4.7's common contract.
pub fn run(conn: &Connection, call: &AlgorithmCall) -> GraphliteResult<String> {
    let graph = csr::load(conn)?;

    macro_rules! empty_or {
        ($empty:expr, $body:expr) => {
            match &graph {
                None => $empty.to_string(),
                Some(g) => $body(g),
            }
        };
    }

    let json = match call {
        AlgorithmCall::PageRank { damping, max_iterations } => {
            empty_or!("[]", |g| pagerank::page_rank(g, *damping, *max_iterations, None))
        }
        AlgorithmCall::TopPageRank { k, damping, max_iterations } => {
            empty_or!("[]", |g| pagerank::page_rank(g, *damping, *max_iterations, Some(*k)))
        }
        AlgorithmCall::PersonalizedPageRank { seeds, damping, max_iterations } => {
            empty_or!("[]", |g| pagerank::personalized_page_rank(g, seeds, *damping, *max_iterations))
        }
        AlgorithmCall::LabelPropagation => empty_or!("[]", |g| label_propagation::run(g)),
        AlgorithmCall::Louvain { resolution } => empty_or!("[]", |g| louvain::run(g, *resolution)),
        AlgorithmCall::Wcc => empty_or!("[]", |g| components::wcc(g)),
        AlgorithmCall::Scc => empty_or!("[]", |g| components::scc(g)),
        AlgorithmCall::BetweennessCentrality => empty_or!("[]", |g| betweenness::run(g)),
        AlgorithmCall::ClosenessCentrality => empty_or!("[]", |g| closeness::run(g)),
        AlgorithmCall::EigenvectorCentrality => empty_or!("[]", |g| eigenvector::run(g)),
        AlgorithmCall::DegreeCentrality => empty_or!("[]", |g| degree::run(g)),
        AlgorithmCall::Dijkstra { source, target, weight_prop } => empty_or!(paths::empty_path_result(), |g| paths::dijkstra(
            conn, g, source, target, weight_prop.as_deref()
        )),
        AlgorithmCall::AStar { source, target, weight_prop } => empty_or!(paths::empty_astar_result(), |g| paths::astar(
            conn,
            g,
            source,
            target,
            weight_prop.as_deref()
        )),
        AlgorithmCall::Apsp => empty_or!("[]", |g| paths::apsp(g)),
        AlgorithmCall::Bfs { source, max_depth } => {
            empty_or!(r#"{"visited":[],"found":false}"#, |g| paths::bfs(g, source, *max_depth))
        }
        AlgorithmCall::Dfs { source, max_depth } => {
            empty_or!(r#"{"visited":[],"found":false}"#, |g| paths::dfs(g, source, *max_depth))
        }
        AlgorithmCall::TriangleCount => empty_or!("[]", |g| triangle::run(g)),
        AlgorithmCall::NodeSimilarity { pair, threshold, top_k } => {
            empty_or!("[]", |g| similarity::node_similarity(g, pair.clone(), *threshold, *top_k))
        }
        AlgorithmCall::Knn { source, k } => empty_or!("[]", |g| similarity::knn(g, source, *k)),
    };
    Ok(json)
}

/// Shared helper: every per-node score algorithm sorts by score descending
/// and renders `[{"id":..,"score":..}, ...]`, truncating to `top_k` if given.
pub(crate) fn render_node_scores(graph: &CsrGraph, mut scores: Vec<(usize, f64)>, top_k: Option<usize>) -> String {
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(k) = top_k {
        scores.truncate(k);
    }
    let mut jb = crate::json::JsonBuilder::new();
    jb.start_array();
    for (idx, score) in scores {
        let mut obj = crate::json::JsonBuilder::new();
        obj.start_object();
        obj.add_key_string("id", &graph.display_id(idx));
        obj.add_key_number("score", score);
        obj.end_object();
        jb.add_item(&obj.take());
    }
    jb.end_array();
    jb.take()
}
