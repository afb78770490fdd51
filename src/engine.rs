//! The Core API (§6): `create(handle) -> engine`, `execute(engine, query) ->
//! result`. `free`/`free_result` have no counterpart here — `Engine` and
//! `QueryResult` are owned Rust values and clean up via `Drop` when dropped.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::catalog::SchemaManager;
use crate::config::EngineConfig;
use crate::error::GraphliteResult;
use crate::executor::{self, QueryResult};
use crate::transform::value::Value;

pub struct Engine {
    mgr: SchemaManager,
    config: EngineConfig,
}

impl Engine {
    /// `handle` is a connection string; `":memory:"` opens a private
    /// in-memory database (spec.md §6), anything else is a filesystem path.
    pub fn create(handle: &str, config: EngineConfig) -> GraphliteResult<Engine> {
        let conn = if handle == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(handle)?
        };
        let mut mgr = SchemaManager::new(conn, config.property_key_cache_slots);
        mgr.initialize()?;
        log::info!("engine initialized against `{handle}`");
        Ok(Engine { mgr, config })
    }

    pub fn execute(&mut self, query_text: &str) -> QueryResult {
        self.execute_with_params(query_text, &HashMap::new())
    }

    pub fn execute_with_params(&mut self, query_text: &str, params: &HashMap<String, Value>) -> QueryResult {
        executor::run(&mut self.mgr, &self.config, query_text, params)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
