//! Jaccard node similarity and asymmetric KNN, grounded on
//! `examples/original_source/src/backend/executor/graph_algo_similarity.c`
//! and `graph_algo_knn.c`.

use std::collections::HashSet;

use crate::csr::CsrGraph;
use crate::json::JsonBuilder;

fn out_set(graph: &CsrGraph, i: usize) -> HashSet<usize> {
    graph.out_neighbors(i).iter().copied().collect()
}

fn jaccard(a: &HashSet<usize>, b: &HashSet<usize>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

pub fn node_similarity(graph: &CsrGraph, pair: Option<(String, String)>, threshold: Option<f64>, top_k: Option<usize>) -> String {
    let n = graph.node_count;
    let sets: Vec<HashSet<usize>> = (0..n).map(|i| out_set(graph, i)).collect();

    if let Some((a, b)) = pair {
        let (Some(ai), Some(bi)) = (graph.index_of_user_id(&a), graph.index_of_user_id(&b)) else {
            return "[]".to_string();
        };
        let score = jaccard(&sets[ai], &sets[bi]);
        return render(&[(ai, bi, score)], graph);
    }

    let mut pairs = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let score = jaccard(&sets[i], &sets[j]);
            if threshold.map(|t| score >= t).unwrap_or(score > 0.0) {
                pairs.push((i, j, score));
            }
        }
    }
    pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(k) = top_k {
        pairs.truncate(k);
    }
    render(&pairs, graph)
}

/// Asymmetric: one fixed source compared against every other node, ranked.
pub fn knn(graph: &CsrGraph, source_user_id: &str, k: usize) -> String {
    let Some(src) = graph.index_of_user_id(source_user_id) else { return "[]".to_string() };
    let sets: Vec<HashSet<usize>> = (0..graph.node_count).map(|i| out_set(graph, i)).collect();

    let mut scored: Vec<(usize, f64)> = (0..graph.node_count)
        .filter(|&i| i != src)
        .map(|i| (i, jaccard(&sets[src], &sets[i])))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);

    let mut jb = JsonBuilder::new();
    jb.start_array();
    for (rank, (idx, score)) in scored.into_iter().enumerate() {
        let mut obj = JsonBuilder::new();
        obj.start_object();
        obj.add_key_string("id", &graph.display_id(idx));
        obj.add_key_number("score", score);
        obj.add_key_int("rank", (rank + 1) as i64);
        obj.end_object();
        jb.add_item(&obj.take());
    }
    jb.end_array();
    jb.take()
}

fn render(pairs: &[(usize, usize, f64)], graph: &CsrGraph) -> String {
    let mut jb = JsonBuilder::new();
    jb.start_array();
    for &(i, j, score) in pairs {
        let mut obj = JsonBuilder::new();
        obj.start_object();
        obj.add_key_string("a", &graph.display_id(i));
        obj.add_key_string("b", &graph.display_id(j));
        obj.add_key_number("score", score);
        obj.end_object();
        jb.add_item(&obj.take());
    }
    jb.end_array();
    jb.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaManager;
    use rusqlite::Connection;

    fn graph_with_shared_neighbor() -> CsrGraph {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        let a = mgr.create_node().unwrap();
        let b = mgr.create_node().unwrap();
        let c = mgr.create_node().unwrap();
        mgr.create_edge(a, c, "T").unwrap();
        mgr.create_edge(b, c, "T").unwrap();
        crate::csr::load(mgr.connection()).unwrap().unwrap()
    }

    #[test]
    fn identical_out_neighborhoods_score_one() {
        let g = graph_with_shared_neighbor();
        let json = node_similarity(&g, Some((g.display_id(0), g.display_id(1))), None, None);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["score"].as_f64().unwrap(), 1.0);
    }

    #[test]
    fn knn_ranks_results() {
        let g = graph_with_shared_neighbor();
        let json = knn(&g, &g.display_id(0), 2);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.as_array().unwrap().len() <= 2);
        assert_eq!(parsed[0]["rank"].as_i64().unwrap(), 1);
    }
}
