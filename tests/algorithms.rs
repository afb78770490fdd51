//! Native graph-algorithm scenarios driven through the public `Engine` API.

use graphlite::{Engine, EngineConfig};

fn engine() -> Engine {
    Engine::create(":memory:", EngineConfig::default()).unwrap()
}

#[test]
fn pagerank_ranks_c_highest_on_the_five_edge_graph() {
    let mut engine = engine();
    engine.execute("CREATE (a {id: 'A'})");
    engine.execute("CREATE (b {id: 'B'})");
    engine.execute("CREATE (c {id: 'C'})");
    engine.execute("CREATE (d {id: 'D'})");
    engine.execute("MATCH (a {id: 'A'}), (b {id: 'B'}) CREATE (a)-[:E]->(b)");
    engine.execute("MATCH (a {id: 'A'}), (c {id: 'C'}) CREATE (a)-[:E]->(c)");
    engine.execute("MATCH (b {id: 'B'}), (c {id: 'C'}) CREATE (b)-[:E]->(c)");
    engine.execute("MATCH (c {id: 'C'}), (a {id: 'A'}) CREATE (c)-[:E]->(a)");
    engine.execute("MATCH (d {id: 'D'}), (c {id: 'C'}) CREATE (d)-[:E]->(c)");

    let result = engine.execute("RETURN pageRank(0.85, 50)");
    assert!(result.success);
    let json: serde_json::Value = serde_json::from_str(result.data[0][0].as_deref().unwrap()).unwrap();
    let scores: std::collections::HashMap<String, f64> =
        json.as_array().unwrap().iter().map(|e| (e["id"].as_str().unwrap().to_string(), e["score"].as_f64().unwrap())).collect();

    let total: f64 = scores.values().sum();
    assert!((total - 1.0).abs() < 0.01, "scores should sum to ~1.0, got {total}");
    assert!(scores["C"] > scores["A"]);
    assert!(scores["A"] > scores["B"]);
    assert!(scores["D"] < 0.1);
    assert!(scores["C"] > 0.3);
}

#[test]
fn dijkstra_multi_hop_chain_matches_exact_scenario() {
    let mut engine = engine();
    engine.execute("CREATE (a {id: 'A'})-[:E]->(b {id: 'B'})-[:E]->(c {id: 'C'})-[:E]->(d {id: 'D'})");

    let result = engine.execute(r#"RETURN dijkstra("A","D")"#);
    assert!(result.success);
    let json: serde_json::Value = serde_json::from_str(result.data[0][0].as_deref().unwrap()).unwrap();
    assert_eq!(json["found"], true);
    assert_eq!(json["distance"].as_f64().unwrap(), 3.0);
    let path: Vec<&str> = json["path"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(path, vec!["A", "B", "C", "D"]);
}

#[test]
fn empty_graph_algorithms_return_their_empty_shape() {
    let mut engine = engine();
    let pagerank = engine.execute("RETURN pageRank()");
    assert_eq!(pagerank.data[0][0].as_deref(), Some("[]"));

    let dijkstra = engine.execute(r#"RETURN dijkstra("A","B")"#);
    let json: serde_json::Value = serde_json::from_str(dijkstra.data[0][0].as_deref().unwrap()).unwrap();
    assert_eq!(json["found"], false);
}

#[test]
fn single_node_degree_centrality_is_zero() {
    let mut engine = engine();
    engine.execute("CREATE (n {id: 'solo'})");
    let result = engine.execute("RETURN degreeCentrality()");
    let json: serde_json::Value = serde_json::from_str(result.data[0][0].as_deref().unwrap()).unwrap();
    assert_eq!(json[0]["in_degree"].as_i64().unwrap(), 0);
    assert_eq!(json[0]["out_degree"].as_i64().unwrap(), 0);
}

#[test]
fn wcc_separates_disconnected_components() {
    let mut engine = engine();
    engine.execute("CREATE (a {id: 'A'})-[:E]->(b {id: 'B'})");
    engine.execute("CREATE (c {id: 'C'})-[:E]->(d {id: 'D'})");
    let result = engine.execute("RETURN wcc()");
    let json: serde_json::Value = serde_json::from_str(result.data[0][0].as_deref().unwrap()).unwrap();
    let entries = json.as_array().unwrap();
    let community_of = |id: &str| entries.iter().find(|e| e["id"] == id).unwrap()["community"].as_i64().unwrap();
    assert_eq!(community_of("A"), community_of("B"));
    assert_eq!(community_of("C"), community_of("D"));
    assert_ne!(community_of("A"), community_of("C"));
}

#[test]
fn triangle_count_finds_one_triangle() {
    let mut engine = engine();
    engine.execute("CREATE (a {id: 'A'})-[:E]->(b {id: 'B'})");
    engine.execute("MATCH (b {id: 'B'}) CREATE (b)-[:E]->(c {id: 'C'})");
    engine.execute("MATCH (c {id: 'C'}), (a {id: 'A'}) CREATE (c)-[:E]->(a)");
    let result = engine.execute("RETURN triangleCount()");
    let json: serde_json::Value = serde_json::from_str(result.data[0][0].as_deref().unwrap()).unwrap();
    let total: i64 = json.as_array().unwrap().iter().map(|e| e["triangles"].as_i64().unwrap()).sum();
    assert!(total > 0);
}
