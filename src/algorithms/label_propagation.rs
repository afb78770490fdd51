//! Synchronous label propagation, grounded on
//! `examples/original_source/src/backend/executor/graph_algo_community.c`.

use std::collections::HashMap;

use crate::csr::CsrGraph;
use crate::json::JsonBuilder;

pub fn run(graph: &CsrGraph) -> String {
    let n = graph.node_count;
    if n == 0 {
        return "[]".to_string();
    }

    let mut labels: Vec<usize> = (0..n).collect();
    const MAX_ITERATIONS: usize = 100;

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for i in 0..n {
            // Sparse tally over both in- and out-neighbours: only labels
            // actually touched this step are counted, O(degree).
            let mut tally: HashMap<usize, usize> = HashMap::new();
            for &j in graph.out_neighbors(i).iter().chain(graph.in_neighbors(i)) {
                *tally.entry(labels[j]).or_insert(0) += 1;
            }
            if tally.is_empty() {
                continue;
            }
            // Higher count wins; ties broken by smaller label id.
            let best = tally
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                .map(|(label, _)| label)
                .unwrap();
            if best != labels[i] {
                labels[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let renumbered = renumber(&labels);

    let mut jb = JsonBuilder::new();
    jb.start_array();
    for (i, &community) in renumbered.iter().enumerate() {
        let mut obj = JsonBuilder::new();
        obj.start_object();
        obj.add_key_string("id", &graph.display_id(i));
        obj.add_key_int("community", community as i64);
        obj.end_object();
        jb.add_item(&obj.take());
    }
    jb.end_array();
    jb.take()
}

/// Map an arbitrary label assignment to contiguous ids `0..k` in first-seen order.
pub(crate) fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut seen: HashMap<usize, usize> = HashMap::new();
    labels
        .iter()
        .map(|&l| {
            let next = seen.len();
            *seen.entry(l).or_insert(next)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaManager;
    use rusqlite::Connection;

    #[test]
    fn two_disjoint_triangles_form_two_communities() {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        let nodes: Vec<i64> = (0..6).map(|_| mgr.create_node().unwrap()).collect();
        for &(a, b) in &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)] {
            mgr.create_edge(nodes[a], nodes[b], "T").unwrap();
        }
        let g = crate::csr::load(mgr.connection()).unwrap().unwrap();
        let json = run(&g);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let communities: std::collections::HashSet<i64> =
            parsed.as_array().unwrap().iter().map(|v| v["community"].as_i64().unwrap()).collect();
        assert_eq!(communities.len(), 2);
    }
}
