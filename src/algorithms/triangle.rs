//! Node-iterator triangle counting, grounded on
//! `examples/original_source/src/backend/executor/graph_algo_triangle.c`.
//! Edges are treated as undirected.

use std::collections::HashSet;

use crate::csr::CsrGraph;
use crate::json::JsonBuilder;

pub fn run(graph: &CsrGraph) -> String {
    let n = graph.node_count;
    let undirected: Vec<HashSet<usize>> = (0..n)
        .map(|i| graph.out_neighbors(i).iter().chain(graph.in_neighbors(i)).copied().filter(|&j| j != i).collect())
        .collect();

    let mut jb = JsonBuilder::new();
    jb.start_array();
    for i in 0..n {
        let neighbors: Vec<usize> = undirected[i].iter().copied().collect();
        let mut triangles = 0u64;
        for a in 0..neighbors.len() {
            for b in (a + 1)..neighbors.len() {
                if undirected[neighbors[a]].contains(&neighbors[b]) {
                    triangles += 1;
                }
            }
        }
        let d = neighbors.len();
        let clustering = if d < 2 { 0.0 } else { (2 * triangles) as f64 / (d * (d - 1)) as f64 };

        let mut obj = JsonBuilder::new();
        obj.start_object();
        obj.add_key_string("id", &graph.display_id(i));
        obj.add_key_int("triangles", triangles as i64);
        obj.add_key_number("clustering_coefficient", clustering);
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

    #[test]
    fn triangle_counts_each_node_once() {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        let nodes: Vec<i64> = (0..3).map(|_| mgr.create_node().unwrap()).collect();
        mgr.create_edge(nodes[0], nodes[1], "T").unwrap();
        mgr.create_edge(nodes[1], nodes[2], "T").unwrap();
        mgr.create_edge(nodes[2], nodes[0], "T").unwrap();
        let g = crate::csr::load(mgr.connection()).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&run(&g)).unwrap();
        for entry in parsed.as_array().unwrap() {
            assert_eq!(entry["triangles"].as_i64().unwrap(), 1);
            assert_eq!(entry["clustering_coefficient"].as_f64().unwrap(), 1.0);
        }
    }
}
