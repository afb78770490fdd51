//! Power iteration on the transposed adjacency (incoming edges), grounded on
//! `examples/original_source/src/backend/executor/graph_algo_eigenvector.c`.

use crate::algorithms::render_node_scores;
use crate::csr::CsrGraph;

const MAX_ITERATIONS: u32 = 100;
const CONVERGENCE_EPS: f64 = 1e-10;

pub fn run(graph: &CsrGraph) -> String {
    let n = graph.node_count;
    if n == 0 {
        return "[]".to_string();
    }
    let mut v = vec![1.0 / (n as f64).sqrt(); n];

    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![0.0f64; n];
        for i in 0..n {
            for &j in graph.in_neighbors(i) {
                next[i] += v[j];
            }
        }
        let norm = next.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 {
            // Degenerate zero-norm: reset to uniform.
            next = vec![1.0 / (n as f64).sqrt(); n];
        } else {
            for x in &mut next {
                *x /= norm;
            }
        }
        let max_delta = (0..n).map(|i| (next[i] - v[i]).abs()).fold(0.0f64, f64::max);
        v = next;
        if max_delta < CONVERGENCE_EPS {
            break;
        }
    }

    render_node_scores(graph, (0..n).map(|i| (i, v[i])).collect(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaManager;
    use rusqlite::Connection;

    #[test]
    fn hub_node_scores_higher_than_leaves() {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        let hub = mgr.create_node().unwrap();
        let leaves: Vec<i64> = (0..3).map(|_| mgr.create_node().unwrap()).collect();
        for &l in &leaves {
            mgr.create_edge(l, hub, "T").unwrap();
        }
        let g = crate::csr::load(mgr.connection()).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&run(&g)).unwrap();
        let hub_score = parsed.as_array().unwrap().iter().find(|v| v["id"] == g.display_id(0)).unwrap()["score"].as_f64().unwrap();
        for entry in parsed.as_array().unwrap().iter().skip(1) {
            assert!(hub_score >= entry["score"].as_f64().unwrap());
        }
    }
}
