//! Drives a parsed query through `transform::execute` and assembles the
//! Core API's text-cell result, grounded on the teacher's
//! `examples/genezhang-clickgraph/src/executor/mod.rs` result-set shape
//! (§6: "result is {success, error_message, row_count, column_count,
//! column_names[], data[row][col] as text, plus the write-counter fields}").

use std::collections::HashMap;

use crate::catalog::SchemaManager;
use crate::config::EngineConfig;
use crate::error::GraphliteError;
use crate::transform::value::Value;
use crate::transform::write::Counters;

/// One row of query output. `None` cells are SQL/Cypher NULL; non-null
/// cells are rendered text per §6's "every string is null-terminated text".
pub type ResultRow = Vec<Option<String>>;

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub success: bool,
    pub error_message: Option<String>,
    pub column_names: Vec<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub data: Vec<ResultRow>,
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub rels_created: u64,
    pub rels_deleted: u64,
    pub properties_set: u64,
}

impl QueryResult {
    fn ok(column_names: Vec<String>, rows: Vec<Vec<Value>>, counters: Counters) -> Self {
        let data: Vec<ResultRow> = rows.into_iter().map(|row| row.into_iter().map(|v| v.render_cell()).collect()).collect();
        QueryResult {
            success: true,
            error_message: None,
            row_count: data.len(),
            column_count: column_names.len(),
            column_names,
            data,
            nodes_created: counters.nodes_created,
            nodes_deleted: counters.nodes_deleted,
            rels_created: counters.rels_created,
            rels_deleted: counters.rels_deleted,
            properties_set: counters.properties_set,
        }
    }

    fn err(message: String) -> Self {
        QueryResult {
            success: false,
            error_message: Some(message),
            column_names: Vec::new(),
            row_count: 0,
            column_count: 0,
            data: Vec::new(),
            nodes_created: 0,
            nodes_deleted: 0,
            rels_created: 0,
            rels_deleted: 0,
            properties_set: 0,
        }
    }
}

/// Parse, transform, and execute one query string. Never panics on bad
/// input — every failure mode is reported in `error_message` with
/// `success: false`, matching the Core API's non-throwing contract.
pub fn run(mgr: &mut SchemaManager, config: &EngineConfig, query_text: &str, params: &HashMap<String, Value>) -> QueryResult {
    let query = match crate::parser::parse_query(query_text) {
        Ok(q) => q,
        Err(e) => return QueryResult::err(GraphliteError::from(e).to_string()),
    };
    match crate::transform::execute(mgr, config, &query, params) {
        Ok(exec) => QueryResult::ok(exec.columns, exec.rows, exec.counters),
        Err(e) => QueryResult::err(e.to_string()),
    }
}
