//! Schema/catalog manager: DDL, property-key interning, and typed property
//! reads/writes. Grounded on `examples/original_source/src/backend/executor/cypher_schema.c`.

pub mod ddl;
mod property_cache;

pub use property_cache::{CacheStats, PropertyKeyCache};

use rusqlite::{Connection, OptionalExtension};

use crate::error::GraphliteResult;

/// The tagged union spec.md §3 calls "Property value". Null is absence of a
/// row, not a variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Integer(i64),
    Text(String),
    Real(f64),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Integer,
    Text,
    Real,
    Boolean,
}

impl PropertyType {
    /// int/text/real/bool — the order the DDL, the cleanup loop, and
    /// `typed_property_ddls` all share.
    pub const ALL: [PropertyType; 4] = [PropertyType::Integer, PropertyType::Text, PropertyType::Real, PropertyType::Boolean];

    pub fn table_suffix(self) -> &'static str {
        match self {
            PropertyType::Integer => "int",
            PropertyType::Text => "text",
            PropertyType::Real => "real",
            PropertyType::Boolean => "bool",
        }
    }

    pub fn of(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Integer(_) => PropertyType::Integer,
            PropertyValue::Text(_) => PropertyType::Text,
            PropertyValue::Real(_) => PropertyType::Real,
            PropertyValue::Boolean(_) => PropertyType::Boolean,
        }
    }
}

/// `infer_property_type` in spec.md §4.3: a convenience classifier for a
/// literal arriving as text.
pub fn infer_property_type(text: &str) -> PropertyType {
    if text == "true" || text == "false" {
        return PropertyType::Boolean;
    }
    if text.parse::<i64>().is_ok() {
        return PropertyType::Integer;
    }
    if text.parse::<f64>().is_ok() {
        return PropertyType::Real;
    }
    PropertyType::Text
}

pub struct SchemaManager {
    conn: Connection,
    key_cache: PropertyKeyCache,
}

impl SchemaManager {
    pub fn new(conn: Connection, cache_slots: usize) -> Self {
        SchemaManager { conn, key_cache: PropertyKeyCache::new(cache_slots) }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn key_cache(&self) -> &PropertyKeyCache {
        &self.key_cache
    }

    /// Create all tables and indices if absent, run ANALYZE once guarded by
    /// a probe of `sqlite_stat1`. Idempotent (invariant 8.2).
    pub fn initialize(&mut self) -> GraphliteResult<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        for ddl in ddl::all_table_ddls() {
            self.conn.execute(&ddl, [])?;
        }
        for ddl in ddl::all_index_ddls() {
            self.conn.execute(&ddl, [])?;
        }

        let needs_analyze: bool = self
            .conn
            .query_row("SELECT 1 FROM sqlite_stat1 WHERE tbl = 'edges' LIMIT 1", [], |_| Ok(()))
            .optional()?
            .is_none();
        if needs_analyze {
            // Non-fatal if it fails: the query planner simply runs without
            // statistics, per the original's comment.
            if let Err(e) = self.conn.execute_batch("ANALYZE") {
                log::warn!("ANALYZE failed, continuing without statistics: {e}");
            }
        }

        Ok(())
    }

    pub fn ensure_property_key(&mut self, key: &str) -> GraphliteResult<i64> {
        self.key_cache.ensure_property_key(&self.conn, key)
    }

    pub fn get_property_key_id(&mut self, key: &str) -> GraphliteResult<Option<i64>> {
        self.key_cache.get_property_key_id(&self.conn, key)
    }

    pub fn create_node(&self) -> GraphliteResult<i64> {
        self.conn.execute("INSERT INTO nodes DEFAULT VALUES", [])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn delete_node(&self, node_id: i64) -> GraphliteResult<()> {
        self.conn.execute("DELETE FROM nodes WHERE id = ?1", [node_id])?;
        Ok(())
    }

    pub fn add_node_label(&self, node_id: i64, label: &str) -> GraphliteResult<()> {
        self.conn.execute("INSERT OR IGNORE INTO node_labels (node_id, label) VALUES (?1, ?2)", (node_id, label))?;
        Ok(())
    }

    pub fn remove_node_label(&self, node_id: i64, label: &str) -> GraphliteResult<()> {
        self.conn.execute("DELETE FROM node_labels WHERE node_id = ?1 AND label = ?2", (node_id, label))?;
        Ok(())
    }

    pub fn node_labels(&self, node_id: i64) -> GraphliteResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT label FROM node_labels WHERE node_id = ?1 ORDER BY label")?;
        let rows = stmt.query_map([node_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn create_edge(&self, source_id: i64, target_id: i64, rel_type: &str) -> GraphliteResult<i64> {
        self.conn.execute(
            "INSERT INTO edges (source_id, target_id, type) VALUES (?1, ?2, ?3)",
            (source_id, target_id, rel_type),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn delete_edge(&self, edge_id: i64) -> GraphliteResult<()> {
        self.conn.execute("DELETE FROM edges WHERE id = ?1", [edge_id])?;
        Ok(())
    }

    pub fn edge_type(&self, edge_id: i64) -> GraphliteResult<Option<String>> {
        self.conn.query_row("SELECT type FROM edges WHERE id = ?1", [edge_id], |row| row.get(0)).optional().map_err(Into::into)
    }

    /// Shared by `set_node_property`/`set_edge_property` (REDESIGN FLAG 1 —
    /// both entity kinds now use delete-then-insert across all four typed
    /// tables, closing the node/edge asymmetry spec.md §9 documents as a bug).
    fn set_typed_property(
        &mut self,
        entity_table_prefix: &str,
        entity_col: &str,
        entity_id: i64,
        key: &str,
        value: &PropertyValue,
    ) -> GraphliteResult<()> {
        let key_id = self.ensure_property_key(key)?;

        for t in PropertyType::ALL {
            let sql = format!(
                "DELETE FROM {entity_table_prefix}_props_{} WHERE {entity_col} = ?1 AND key_id = ?2",
                t.table_suffix()
            );
            self.conn.execute(&sql, (entity_id, key_id))?;
        }

        let target = PropertyType::of(value);
        let sql = format!(
            "INSERT INTO {entity_table_prefix}_props_{} ({entity_col}, key_id, value) VALUES (?1, ?2, ?3)",
            target.table_suffix()
        );
        match value {
            PropertyValue::Integer(v) => self.conn.execute(&sql, (entity_id, key_id, v))?,
            PropertyValue::Text(v) => self.conn.execute(&sql, (entity_id, key_id, v))?,
            PropertyValue::Real(v) => self.conn.execute(&sql, (entity_id, key_id, v))?,
            PropertyValue::Boolean(v) => self.conn.execute(&sql, (entity_id, key_id, *v as i64))?,
        };
        Ok(())
    }

    pub fn set_node_property(&mut self, node_id: i64, key: &str, value: &PropertyValue) -> GraphliteResult<()> {
        self.set_typed_property("node", "node_id", node_id, key, value)
    }

    pub fn set_edge_property(&mut self, edge_id: i64, key: &str, value: &PropertyValue) -> GraphliteResult<()> {
        self.set_typed_property("edge", "edge_id", edge_id, key, value)
    }

    /// Idempotent across all four typed tables, regardless of which one the
    /// value actually lives in (spec.md §8's REMOVE-idempotence scenario).
    pub fn remove_node_property(&mut self, node_id: i64, key: &str) -> GraphliteResult<u64> {
        self.remove_typed_property("node", "node_id", node_id, key)
    }

    pub fn remove_edge_property(&mut self, edge_id: i64, key: &str) -> GraphliteResult<u64> {
        self.remove_typed_property("edge", "edge_id", edge_id, key)
    }

    fn remove_typed_property(
        &mut self,
        entity_table_prefix: &str,
        entity_col: &str,
        entity_id: i64,
        key: &str,
    ) -> GraphliteResult<u64> {
        let Some(key_id) = self.get_property_key_id(key)? else {
            return Ok(0);
        };
        let mut removed = 0u64;
        for t in PropertyType::ALL {
            let sql = format!(
                "DELETE FROM {entity_table_prefix}_props_{} WHERE {entity_col} = ?1 AND key_id = ?2",
                t.table_suffix()
            );
            removed += self.conn.execute(&sql, (entity_id, key_id))? as u64;
        }
        Ok(removed)
    }

    /// Coalesced read across the four typed tables for (entity, key). Used
    /// by WHERE/RETURN lowering's property-access path.
    pub fn get_node_property(&mut self, node_id: i64, key: &str) -> GraphliteResult<Option<PropertyValue>> {
        self.get_typed_property("node", "node_id", node_id, key)
    }

    pub fn get_edge_property(&mut self, edge_id: i64, key: &str) -> GraphliteResult<Option<PropertyValue>> {
        self.get_typed_property("edge", "edge_id", edge_id, key)
    }

    fn get_typed_property(
        &mut self,
        entity_table_prefix: &str,
        entity_col: &str,
        entity_id: i64,
        key: &str,
    ) -> GraphliteResult<Option<PropertyValue>> {
        let Some(key_id) = self.get_property_key_id(key)? else {
            return Ok(None);
        };

        macro_rules! probe {
            ($suffix:literal, $variant:ident, $sql_ty:ty) => {{
                let sql = format!(
                    "SELECT value FROM {entity_table_prefix}_props_{} WHERE {entity_col} = ?1 AND key_id = ?2",
                    $suffix
                );
                let v: Option<$sql_ty> =
                    self.conn.query_row(&sql, (entity_id, key_id), |row| row.get(0)).optional()?;
                if let Some(v) = v {
                    return Ok(Some(PropertyValue::$variant(v.into())));
                }
            }};
        }

        probe!("int", Integer, i64);
        probe!("text", Text, String);
        probe!("real", Real, f64);
        {
            let sql = format!(
                "SELECT value FROM {entity_table_prefix}_props_bool WHERE {entity_col} = ?1 AND key_id = ?2"
            );
            let v: Option<i64> = self.conn.query_row(&sql, (entity_id, key_id), |row| row.get(0)).optional()?;
            if let Some(v) = v {
                return Ok(Some(PropertyValue::Boolean(v != 0)));
            }
        }
        Ok(None)
    }

    /// `keys(n)`: union of the four typed tables' key names for this entity,
    /// replacing the original's EXISTS+UNION ALL construction that produced
    /// empty arrays (spec.md §4.4's documented regression fix).
    pub fn node_keys(&self, node_id: i64) -> GraphliteResult<Vec<String>> {
        self.entity_keys("node", "node_id", node_id)
    }

    pub fn edge_keys(&self, edge_id: i64) -> GraphliteResult<Vec<String>> {
        self.entity_keys("edge", "edge_id", edge_id)
    }

    fn entity_keys(&self, entity_table_prefix: &str, entity_col: &str, entity_id: i64) -> GraphliteResult<Vec<String>> {
        let sql = format!(
            "SELECT pk.key FROM property_keys pk JOIN {entity_table_prefix}_props_int t ON t.key_id = pk.id AND t.{entity_col} = ?1 \
             UNION SELECT pk.key FROM property_keys pk JOIN {entity_table_prefix}_props_text t ON t.key_id = pk.id AND t.{entity_col} = ?1 \
             UNION SELECT pk.key FROM property_keys pk JOIN {entity_table_prefix}_props_real t ON t.key_id = pk.id AND t.{entity_col} = ?1 \
             UNION SELECT pk.key FROM property_keys pk JOIN {entity_table_prefix}_props_bool t ON t.key_id = pk.id AND t.{entity_col} = ?1 \
             ORDER BY 1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([entity_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn node_exists(&self, node_id: i64) -> GraphliteResult<bool> {
        Ok(self.conn.query_row("SELECT 1 FROM nodes WHERE id = ?1", [node_id], |_| Ok(())).optional()?.is_some())
    }

    /// DELETE refuses a node with live edges unless DETACH is specified.
    pub fn node_has_edges(&self, node_id: i64) -> GraphliteResult<bool> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM edges WHERE source_id = ?1 OR target_id = ?1 LIMIT 1",
                [node_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    pub fn detach_node(&self, node_id: i64) -> GraphliteResult<u64> {
        let n = self.conn.execute("DELETE FROM edges WHERE source_id = ?1 OR target_id = ?1", [node_id])?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SchemaManager {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        mgr
    }

    #[test]
    fn initialize_creates_all_nine_tables_and_indices() {
        let mgr = manager();
        let table_count: i64 = mgr
            .connection()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND (name LIKE '%props%' OR name IN ('nodes','edges','property_keys','node_labels'))",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 12);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut mgr = manager();
        mgr.initialize().unwrap();
        let node_id = mgr.create_node().unwrap();
        assert!(mgr.node_exists(node_id).unwrap());
    }

    #[test]
    fn property_type_exclusivity_across_set_calls() {
        let mut mgr = manager();
        let n = mgr.create_node().unwrap();
        mgr.set_node_property(n, "k", &PropertyValue::Integer(1)).unwrap();
        mgr.set_node_property(n, "k", &PropertyValue::Text("two".into())).unwrap();
        assert_eq!(mgr.get_node_property(n, "k").unwrap(), Some(PropertyValue::Text("two".into())));

        let int_rows: i64 = mgr
            .connection()
            .query_row("SELECT count(*) FROM node_props_int WHERE node_id = ?1", [n], |row| row.get(0))
            .unwrap();
        assert_eq!(int_rows, 0);
    }

    #[test]
    fn remove_then_read_is_null() {
        let mut mgr = manager();
        let n = mgr.create_node().unwrap();
        mgr.set_node_property(n, "a", &PropertyValue::Integer(1)).unwrap();
        let removed = mgr.remove_node_property(n, "a").unwrap();
        assert_eq!(removed, 1);
        assert_eq!(mgr.get_node_property(n, "a").unwrap(), None);
        assert_eq!(mgr.remove_node_property(n, "nonexistent").unwrap(), 0);
    }

    #[test]
    fn node_delete_cascades_edges_and_labels() {
        let mut mgr = manager();
        let a = mgr.create_node().unwrap();
        let b = mgr.create_node().unwrap();
        mgr.add_node_label(a, "L").unwrap();
        mgr.create_edge(a, b, "T").unwrap();
        mgr.set_node_property(a, "k", &PropertyValue::Integer(1)).unwrap();

        mgr.delete_node(a).unwrap();

        assert!(mgr.node_labels(a).unwrap().is_empty());
        assert_eq!(mgr.get_node_property(a, "k").unwrap(), None);
        let edge_count: i64 =
            mgr.connection().query_row("SELECT count(*) FROM edges WHERE source_id = ?1", [a], |row| row.get(0)).unwrap();
        assert_eq!(edge_count, 0);
    }

    #[test]
    fn ensure_property_key_stable_id() {
        let mut mgr = manager();
        let a = mgr.ensure_property_key("name").unwrap();
        let b = mgr.ensure_property_key("name").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn edge_property_uses_delete_then_insert_like_nodes() {
        let mut mgr = manager();
        let a = mgr.create_node().unwrap();
        let b = mgr.create_node().unwrap();
        let e = mgr.create_edge(a, b, "T").unwrap();
        mgr.set_edge_property(e, "w", &PropertyValue::Integer(5)).unwrap();
        mgr.set_edge_property(e, "w", &PropertyValue::Real(2.5)).unwrap();
        assert_eq!(mgr.get_edge_property(e, "w").unwrap(), Some(PropertyValue::Real(2.5)));
        let int_rows: i64 = mgr
            .connection()
            .query_row("SELECT count(*) FROM edge_props_int WHERE edge_id = ?1", [e], |row| row.get(0))
            .unwrap();
        assert_eq!(int_rows, 0);
    }
}
