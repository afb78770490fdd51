//! Single-pass degree centrality, grounded on
//! `examples/original_source/src/backend/executor/graph_algo_centrality.c`.

use crate::csr::CsrGraph;
use crate::json::JsonBuilder;

pub fn run(graph: &CsrGraph) -> String {
    let mut jb = JsonBuilder::new();
    jb.start_array();
    for i in 0..graph.node_count {
        let mut obj = JsonBuilder::new();
        obj.start_object();
        obj.add_key_string("id", &graph.display_id(i));
        obj.add_key_int("in_degree", graph.in_degree(i) as i64);
        obj.add_key_int("out_degree", graph.out_degree(i) as i64);
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
    fn degrees_match_edge_counts() {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        let a = mgr.create_node().unwrap();
        let b = mgr.create_node().unwrap();
        let c = mgr.create_node().unwrap();
        mgr.create_edge(a, b, "T").unwrap();
        mgr.create_edge(a, c, "T").unwrap();
        let g = crate::csr::load(mgr.connection()).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&run(&g)).unwrap();
        assert_eq!(parsed[0]["out_degree"].as_i64().unwrap(), 2);
        assert_eq!(parsed[1]["in_degree"].as_i64().unwrap(), 1);
    }
}
