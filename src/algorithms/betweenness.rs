//! Brandes' algorithm, grounded on
//! `examples/original_source/src/backend/executor/graph_algo_betweenness.c`.
//! Directed interpretation: no /2 normalisation.

use crate::algorithms::render_node_scores;
use crate::csr::CsrGraph;

pub fn run(graph: &CsrGraph) -> String {
    let n = graph.node_count;
    let mut score = vec![0.0f64; n];

    for s in 0..n {
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![-1i64; n];
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = std::collections::VecDeque::new();
        queue.push_back(s);
        let mut order = Vec::new();
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &w in graph.out_neighbors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        for &w in order.iter().rev() {
            for &v in &preds[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                score[w] += delta[w];
            }
        }
    }

    render_node_scores(graph, (0..n).map(|i| (i, score[i])).collect(), None)
}
