//! WCC (union-find) and SCC (iterative Tarjan), grounded on
//! `examples/original_source/src/backend/executor/graph_algo_components.c`.

use crate::algorithms::label_propagation::renumber;
use crate::csr::CsrGraph;
use crate::json::JsonBuilder;

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind { parent: (0..n).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

pub fn wcc(graph: &CsrGraph) -> String {
    let n = graph.node_count;
    if n == 0 {
        return "[]".to_string();
    }
    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for &j in graph.out_neighbors(i) {
            uf.union(i, j);
        }
    }
    let roots: Vec<usize> = (0..n).map(|i| uf.find(i)).collect();
    render(graph, &renumber(&roots))
}

/// Iterative Tarjan: an explicit frame stack carrying (node, neighbour
/// cursor) records instead of native recursion, so long chains don't blow
/// the call stack (spec.md §9's "recursion to iteration" note).
pub fn scc(graph: &CsrGraph) -> String {
    let n = graph.node_count;
    if n == 0 {
        return "[]".to_string();
    }

    let mut index = vec![usize::MAX; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut next_index = 0usize;
    let mut components = vec![usize::MAX; n];
    let mut next_component = 0usize;

    struct Frame {
        node: usize,
        cursor: usize,
    }

    for start in 0..n {
        if index[start] != usize::MAX {
            continue;
        }
        let mut frames = vec![Frame { node: start, cursor: 0 }];
        index[start] = next_index;
        lowlink[start] = next_index;
        next_index += 1;
        stack.push(start);
        on_stack[start] = true;

        while let Some(frame) = frames.last_mut() {
            let v = frame.node;
            let neighbors = graph.out_neighbors(v);
            if frame.cursor < neighbors.len() {
                let w = neighbors[frame.cursor];
                frame.cursor += 1;
                if index[w] == usize::MAX {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    frames.push(Frame { node: w, cursor: 0 });
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
            } else {
                frames.pop();
                if let Some(parent) = frames.last() {
                    lowlink[parent.node] = lowlink[parent.node].min(lowlink[v]);
                }
                if lowlink[v] == index[v] {
                    loop {
                        let w = stack.pop().unwrap();
                        on_stack[w] = false;
                        components[w] = next_component;
                        if w == v {
                            break;
                        }
                    }
                    next_component += 1;
                }
            }
        }
    }

    render(graph, &components)
}

fn render(graph: &CsrGraph, component: &[usize]) -> String {
    let mut jb = JsonBuilder::new();
    jb.start_array();
    for (i, &c) in component.iter().enumerate() {
        let mut obj = JsonBuilder::new();
        obj.start_object();
        obj.add_key_string("id", &graph.display_id(i));
        obj.add_key_int("component", c as i64);
        obj.end_object();
        jb.add_item(&obj.take());
    }
    jb.end_array();
    jb.take()
}
