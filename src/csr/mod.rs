//! In-memory Compressed-Sparse-Row snapshot of the relational graph.
//! Ported from `csr_graph_load` in `examples/original_source/src/backend/executor/graph_algorithms.c`.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::error::GraphliteResult;

/// A point-in-time, read-only adjacency snapshot. Never mutated after
/// construction (§4.6); dropped at the end of the algorithm call that built it.
pub struct CsrGraph {
    pub node_count: usize,
    pub edge_count: usize,
    pub row_ptr: Vec<usize>,
    pub col_idx: Vec<usize>,
    pub in_row_ptr: Vec<usize>,
    pub in_col_idx: Vec<usize>,
    /// internal index -> `nodes.id` rowid.
    pub node_ids: Vec<i64>,
    /// internal index -> the `id` text property, when the node has one.
    pub user_ids: Vec<Option<String>>,
    node_idx: HashMap<i64, usize>,
}

impl CsrGraph {
    pub fn out_neighbors(&self, idx: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[idx]..self.row_ptr[idx + 1]]
    }

    pub fn in_neighbors(&self, idx: usize) -> &[usize] {
        &self.in_col_idx[self.in_row_ptr[idx]..self.in_row_ptr[idx + 1]]
    }

    pub fn out_degree(&self, idx: usize) -> usize {
        self.row_ptr[idx + 1] - self.row_ptr[idx]
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.in_row_ptr[idx + 1] - self.in_row_ptr[idx]
    }

    pub fn index_of_rowid(&self, rowid: i64) -> Option<usize> {
        self.node_idx.get(&rowid).copied()
    }

    /// Resolve a `user_id` (the `id` text property, falling back to the
    /// rowid rendered as text) to an internal index.
    pub fn index_of_user_id(&self, user_id: &str) -> Option<usize> {
        if let Some(i) = self.user_ids.iter().position(|u| u.as_deref() == Some(user_id)) {
            return Some(i);
        }
        user_id.parse::<i64>().ok().and_then(|rowid| self.index_of_rowid(rowid))
    }

    pub fn display_id(&self, idx: usize) -> String {
        self.user_ids[idx].clone().unwrap_or_else(|| self.node_ids[idx].to_string())
    }
}

/// Load a fresh snapshot. Returns `None` for an empty graph (`node_count == 0`),
/// per §4.6 — callers must treat that as the empty-graph case.
pub fn load(conn: &Connection) -> GraphliteResult<Option<CsrGraph>> {
    let mut node_ids = Vec::new();
    {
        let mut stmt = conn.prepare("SELECT id FROM nodes ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        for r in rows {
            node_ids.push(r?);
        }
    }

    if node_ids.is_empty() {
        return Ok(None);
    }

    let node_count = node_ids.len();
    let mut node_idx = HashMap::with_capacity(node_count * 2);
    for (i, &id) in node_ids.iter().enumerate() {
        node_idx.insert(id, i);
    }

    let edges: Vec<(i64, i64)> = {
        let mut stmt = conn.prepare("SELECT source_id, target_id FROM edges")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        rows.collect::<Result<_, _>>()?
    };

    let mut row_ptr = vec![0usize; node_count + 1];
    let mut in_row_ptr = vec![0usize; node_count + 1];
    let mut resolved = Vec::with_capacity(edges.len());
    for (src, tgt) in &edges {
        // Missing endpoints are skipped silently: FK cascade guarantees
        // consistency outside of races a reader may observe mid-snapshot.
        let (Some(&s), Some(&t)) = (node_idx.get(src), node_idx.get(tgt)) else { continue };
        row_ptr[s + 1] += 1;
        in_row_ptr[t + 1] += 1;
        resolved.push((s, t));
    }

    for i in 1..=node_count {
        row_ptr[i] += row_ptr[i - 1];
        in_row_ptr[i] += in_row_ptr[i - 1];
    }

    let edge_count = resolved.len();
    let mut col_idx = vec![0usize; edge_count];
    let mut in_col_idx = vec![0usize; edge_count];
    let mut out_cursor = row_ptr.clone();
    let mut in_cursor = in_row_ptr.clone();
    for (s, t) in resolved {
        col_idx[out_cursor[s]] = t;
        out_cursor[s] += 1;
        in_col_idx[in_cursor[t]] = s;
        in_cursor[t] += 1;
    }

    let mut user_ids = vec![None; node_count];
    {
        let mut stmt = conn.prepare(
            "SELECT node_id, value FROM node_props_text \
             JOIN property_keys ON property_keys.id = node_props_text.key_id \
             WHERE property_keys.key = 'id'",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        for r in rows {
            let (node_id, value) = r?;
            if let Some(&idx) = node_idx.get(&node_id) {
                user_ids[idx] = Some(value);
            }
        }
    }

    Ok(Some(CsrGraph { node_count, edge_count, row_ptr, col_idx, in_row_ptr, in_col_idx, node_ids, user_ids, node_idx }))
}
