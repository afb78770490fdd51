//! Harmonic closeness centrality, grounded on
//! `examples/original_source/src/backend/executor/graph_algo_closeness.c`.
//! Treats edges as undirected; tolerates disconnected graphs.

use crate::algorithms::render_node_scores;
use crate::csr::CsrGraph;

pub fn run(graph: &CsrGraph) -> String {
    let n = graph.node_count;
    if n <= 1 {
        return render_node_scores(graph, (0..n).map(|i| (i, 0.0)).collect(), None);
    }

    let mut scores = Vec::with_capacity(n);
    for s in 0..n {
        let mut dist = vec![-1i64; n];
        dist[s] = 0;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(s);
        let mut sum_inv_dist = 0.0f64;
        while let Some(v) = queue.pop_front() {
            for &w in graph.out_neighbors(v).iter().chain(graph.in_neighbors(v)) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    sum_inv_dist += 1.0 / dist[w] as f64;
                    queue.push_back(w);
                }
            }
        }
        scores.push((s, sum_inv_dist / (n - 1) as f64));
    }
    render_node_scores(graph, scores, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaManager;
    use rusqlite::Connection;

    #[test]
    fn single_node_scores_zero() {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        mgr.create_node().unwrap();
        let g = crate::csr::load(mgr.connection()).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&run(&g)).unwrap();
        assert_eq!(parsed.as_array().unwrap()[0]["score"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn disconnected_pair_scores_zero_for_each() {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        mgr.create_node().unwrap();
        mgr.create_node().unwrap();
        let g = crate::csr::load(mgr.connection()).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&run(&g)).unwrap();
        for entry in parsed.as_array().unwrap() {
            assert_eq!(entry["score"].as_f64().unwrap(), 0.0);
        }
    }

    #[test]
    fn connected_chain_has_positive_scores() {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        let a = mgr.create_node().unwrap();
        let b = mgr.create_node().unwrap();
        mgr.create_edge(a, b, "T").unwrap();
        let g = crate::csr::load(mgr.connection()).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&run(&g)).unwrap();
        for entry in parsed.as_array().unwrap() {
            assert!(entry["score"].as_f64().unwrap() > 0.0);
        }
    }
}
