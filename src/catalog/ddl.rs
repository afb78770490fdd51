//! DDL and index text, ported verbatim from the catalog invariant in
//! spec.md §3 / the original `cypher_schema.c` constants.

pub const DDL_NODES: &str = "CREATE TABLE IF NOT EXISTS nodes (\
    id INTEGER PRIMARY KEY AUTOINCREMENT\
)";

pub const DDL_EDGES: &str = "CREATE TABLE IF NOT EXISTS edges (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    source_id INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE, \
    target_id INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE, \
    type TEXT NOT NULL\
)";

pub const DDL_PROPERTY_KEYS: &str = "CREATE TABLE IF NOT EXISTS property_keys (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    key TEXT UNIQUE NOT NULL\
)";

pub const DDL_NODE_LABELS: &str = "CREATE TABLE IF NOT EXISTS node_labels (\
    node_id INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE, \
    label TEXT NOT NULL, \
    PRIMARY KEY (node_id, label)\
)";

fn typed_prop_ddl(table: &str, entity_col: &str, referenced_table: &str, value_sql: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
            {entity_col} INTEGER NOT NULL REFERENCES {referenced_table}(id) ON DELETE CASCADE, \
            key_id INTEGER NOT NULL REFERENCES property_keys(id), \
            value {value_sql}, \
            PRIMARY KEY ({entity_col}, key_id)\
        )"
    )
}

/// The four typed tables for an entity kind (`entity_prefix` = `node` or
/// `edge`, `referenced_table` = `nodes` or `edges`), in int/text/real/bool
/// order — the order `set_typed_property`'s cleanup loop iterates and the
/// order `PropertyType::ALL` is defined in.
pub fn typed_property_ddls(entity_col: &str, entity_prefix: &str, referenced_table: &str) -> [String; 4] {
    [
        typed_prop_ddl(&format!("{entity_prefix}_props_int"), entity_col, referenced_table, "INTEGER NOT NULL"),
        typed_prop_ddl(&format!("{entity_prefix}_props_text"), entity_col, referenced_table, "TEXT NOT NULL"),
        typed_prop_ddl(&format!("{entity_prefix}_props_real"), entity_col, referenced_table, "REAL NOT NULL"),
        typed_prop_ddl(
            &format!("{entity_prefix}_props_bool"),
            entity_col,
            referenced_table,
            "INTEGER NOT NULL CHECK (value IN (0, 1))",
        ),
    ]
}

pub const INDEX_EDGES_SOURCE: &str = "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id, type)";
pub const INDEX_EDGES_TARGET: &str = "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id, type)";
pub const INDEX_EDGES_TYPE: &str = "CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(type)";
pub const INDEX_NODE_LABELS: &str = "CREATE INDEX IF NOT EXISTS idx_node_labels_label ON node_labels(label, node_id)";
pub const INDEX_PROPERTY_KEYS: &str = "CREATE INDEX IF NOT EXISTS idx_property_keys_key ON property_keys(key)";

pub fn typed_property_index(entity_table: &str, type_name: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS idx_{entity_table}_props_{type_name}_key_value \
         ON {entity_table}_props_{type_name}(key_id, value, {col})",
        col = if entity_table == "node" { "node_id" } else { "edge_id" }
    )
}

/// Every DDL statement `initialize()` runs, in dependency order (base
/// tables before the typed property tables that reference `property_keys`).
pub fn all_table_ddls() -> Vec<String> {
    let mut ddls = vec![
        DDL_NODES.to_string(),
        DDL_EDGES.to_string(),
        DDL_PROPERTY_KEYS.to_string(),
        DDL_NODE_LABELS.to_string(),
    ];
    ddls.extend(typed_property_ddls("node_id", "node", "nodes"));
    ddls.extend(typed_property_ddls("edge_id", "edge", "edges"));
    ddls
}

pub fn all_index_ddls() -> Vec<String> {
    let mut ddls = vec![
        INDEX_EDGES_SOURCE.to_string(),
        INDEX_EDGES_TARGET.to_string(),
        INDEX_EDGES_TYPE.to_string(),
        INDEX_NODE_LABELS.to_string(),
        INDEX_PROPERTY_KEYS.to_string(),
    ];
    for type_name in ["int", "text", "real", "bool"] {
        ddls.push(typed_property_index("node", type_name));
    }
    for type_name in ["int", "text", "real", "bool"] {
        ddls.push(typed_property_index("edge", type_name));
    }
    ddls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_table_ddls_covers_nine_tables() {
        assert_eq!(all_table_ddls().len(), 4 + 4 + 4);
    }

    #[test]
    fn all_index_ddls_covers_every_named_index() {
        // 3 edge + 1 label + 1 property_keys + 4 node-prop + 4 edge-prop
        assert_eq!(all_index_ddls().len(), 3 + 1 + 1 + 4 + 4);
    }
}
