//! Testable-property invariants and round-trip laws (spec §8), driven
//! through the public `Engine` API.

use graphlite::{Engine, EngineConfig};

fn engine() -> Engine {
    Engine::create(":memory:", EngineConfig::default()).unwrap()
}

#[test]
fn create_then_return_preserves_every_property_type() {
    let mut engine = engine();
    engine.execute("CREATE (n:T {i: 1, f: 2.5, s: 'hi', b: true})");
    let result = engine.execute("MATCH (n:T) RETURN n.i, n.f, n.s, n.b");
    assert!(result.success);
    assert_eq!(result.data[0][0].as_deref(), Some("1"));
    assert_eq!(result.data[0][1].as_deref(), Some("2.5"));
    assert_eq!(result.data[0][2].as_deref(), Some("hi"));
    assert_eq!(result.data[0][3].as_deref(), Some("true"));
}

#[test]
fn set_set_return_yields_the_second_value_across_type_changes() {
    let mut engine = engine();
    engine.execute("CREATE (n:T {k: 1})");
    engine.execute("MATCH (n:T) SET n.k = 'now a string'");
    let result = engine.execute("MATCH (n:T) RETURN n.k");
    assert_eq!(result.data[0][0].as_deref(), Some("now a string"));
}

#[test]
fn remove_after_set_yields_null() {
    let mut engine = engine();
    engine.execute("CREATE (n:T {k: 42})");
    engine.execute("MATCH (n:T) REMOVE n.k");
    let result = engine.execute("MATCH (n:T) RETURN n.k");
    assert_eq!(result.data[0][0], None);
}

#[test]
fn merge_twice_yields_a_single_node() {
    let mut engine = engine();
    engine.execute("MERGE (n:L {k: 'v'})");
    engine.execute("MERGE (n:L {k: 'v'})");
    let result = engine.execute("MATCH (n:L) RETURN count(n) AS c");
    assert_eq!(result.data[0][0].as_deref(), Some("1"));
}

#[test]
fn variable_kind_preservation_survives_two_with_boundaries() {
    let mut engine = engine();
    engine.execute("CREATE (n:Person {name: 'Ada'})");
    let result = engine.execute("MATCH (n:Person) WITH n WITH n RETURN n.name");
    assert!(result.success);
    assert_eq!(result.data[0][0].as_deref(), Some("Ada"));
}

#[test]
fn detach_delete_leaves_no_dangling_edges_or_properties() {
    let mut engine = engine();
    engine.execute("CREATE (a:X {k: 1})-[:R {w: 1}]->(b:X {k: 2})");
    engine.execute("MATCH (a:X)-[:R]->(b:X) DETACH DELETE a, b");

    let edges = engine.execute("MATCH (n:X)-[r]->(m:X) RETURN r");
    assert_eq!(edges.row_count, 0);
    let nodes = engine.execute("MATCH (n:X) RETURN n");
    assert_eq!(nodes.row_count, 0);
}

#[test]
fn union_all_reports_exactly_double_the_rows() {
    let mut engine = engine();
    engine.execute("CREATE (:Person {name: 'Alice'})");
    engine.execute("CREATE (:Person {name: 'Bob'})");
    let single = engine.execute("MATCH (p:Person) RETURN p.name");
    let doubled = engine.execute("MATCH (p:Person) RETURN p.name UNION ALL MATCH (p:Person) RETURN p.name");
    assert_eq!(doubled.row_count, single.row_count * 2);
}

#[test]
fn optional_match_with_no_matching_relationship_binds_null() {
    let mut engine = engine();
    engine.execute("CREATE (n:Lonely)");
    let result = engine.execute("MATCH (n:Lonely) OPTIONAL MATCH (n)-[:R]->(m) RETURN m");
    assert!(result.success);
    assert_eq!(result.row_count, 1);
    assert_eq!(result.data[0][0], None);
}

#[test]
fn foreach_applies_updates_for_every_list_element() {
    let mut engine = engine();
    engine.execute("CREATE (n:Counter {total: 0})");
    engine.execute("MATCH (n:Counter) FOREACH (x IN [1, 2, 3] | SET n.total = n.total + x)");
    let result = engine.execute("MATCH (n:Counter) RETURN n.total");
    assert_eq!(result.data[0][0].as_deref(), Some("6"));
}

#[test]
fn unwind_expands_a_list_into_one_row_per_element() {
    let mut engine = engine();
    let result = engine.execute("UNWIND [1, 2, 3] AS x RETURN x ORDER BY x");
    assert!(result.success);
    assert_eq!(result.row_count, 3);
    assert_eq!(result.data[2][0].as_deref(), Some("3"));
}

#[test]
fn relationships_and_nodes_reflect_the_bound_path() {
    let mut engine = engine();
    engine.execute("CREATE (:X {k: 'a'})-[:R]->(:X {k: 'b'})-[:R]->(:X {k: 'c'})");
    let result = engine.execute(
        "MATCH p = (a:X {k: 'a'})-[:R]->()-[:R]->(c:X {k: 'c'}) RETURN size(relationships(p)), size(nodes(p))",
    );
    assert!(result.success);
    assert_eq!(result.data[0][0].as_deref(), Some("2"));
    assert_eq!(result.data[0][1].as_deref(), Some("3"));
}

#[test]
fn zero_length_variable_hop_matches_the_start_node_itself() {
    let mut engine = engine();
    engine.execute("CREATE (:X {k: 'solo'})");
    let result = engine.execute("MATCH (a:X)-[:R*0..2]->(b) RETURN count(b) AS c");
    assert!(result.success);
    assert_eq!(result.data[0][0].as_deref(), Some("1"));
}
