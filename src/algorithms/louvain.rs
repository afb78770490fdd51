//! Louvain modularity optimisation, grounded on
//! `examples/original_source/src/backend/executor/graph_algo_louvain.c`.
//! Edges are treated as undirected by summing in- and out-degree.

use std::collections::HashMap;

use crate::algorithms::label_propagation::renumber;
use crate::csr::CsrGraph;
use crate::json::JsonBuilder;

const MAX_PASSES: usize = 100;

pub fn run(graph: &CsrGraph, resolution: f64) -> String {
    let n = graph.node_count;
    if n == 0 {
        return "[]".to_string();
    }

    // Undirected edge list and per-node total degree (used as k_i).
    let mut degree = vec![0.0f64; n];
    let mut undirected_neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut m = 0.0f64;
    for i in 0..n {
        for &j in graph.out_neighbors(i) {
            undirected_neighbors[i].push(j);
            undirected_neighbors[j].push(i);
            degree[i] += 1.0;
            degree[j] += 1.0;
            m += 1.0;
        }
    }
    if m == 0.0 {
        return render(graph, &(0..n).collect::<Vec<_>>());
    }

    let mut community: Vec<usize> = (0..n).collect();
    let mut sigma_tot = degree.clone();

    for _ in 0..MAX_PASSES {
        let mut moved = false;
        for i in 0..n {
            let ki = degree[i];
            let current = community[i];

            // Weight of i's edges into each neighbouring community.
            let mut k_i_in: HashMap<usize, f64> = HashMap::new();
            for &j in &undirected_neighbors[i] {
                if j != i {
                    *k_i_in.entry(community[j]).or_insert(0.0) += 1.0;
                }
            }
            let k_i_in_current = k_i_in.get(&current).copied().unwrap_or(0.0);

            // Remove i from its current community before evaluating moves.
            sigma_tot[current] -= ki;

            let mut best_community = current;
            let mut best_delta = 0.0f64;
            for (&cand, &k_i_in_cand) in &k_i_in {
                if cand == current {
                    continue;
                }
                let delta = (k_i_in_cand - k_i_in_current) / m
                    - resolution * ki * (sigma_tot.get(cand).copied().unwrap_or(0.0) - sigma_tot[current] + ki) / (2.0 * m * m);
                if delta > best_delta {
                    best_delta = delta;
                    best_community = cand;
                }
            }

            sigma_tot[best_community] += ki;
            if best_community != current {
                community[i] = best_community;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    render(graph, &community)
}

fn render(graph: &CsrGraph, community: &[usize]) -> String {
    let renumbered = renumber(community);
    let mut jb = JsonBuilder::new();
    jb.start_array();
    for (i, &c) in renumbered.iter().enumerate() {
        let mut obj = JsonBuilder::new();
        obj.start_object();
        obj.add_key_string("id", &graph.display_id(i));
        obj.add_key_int("community", c as i64);
        obj.end_object();
        jb.add_item(&obj.take());
    }
    jb.end_array();
    jb.take()
}
