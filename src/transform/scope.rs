//! Variable-kind-preserving scope, grounded on the teacher's
//! `examples/genezhang-clickgraph/src/query_planner/logical_expr/typed_variable.rs`
//! (a name carries its kind through every projection boundary).
//!
//! A `WITH v` must pass `v` through at its bound kind, not coerce it to a
//! scalar rowid — the regression spec.md §3/§8 calls out by name.

use std::collections::HashMap;

use crate::transform::value::{Kind, Value};

#[derive(Debug, Clone)]
pub struct Binding {
    pub kind: Kind,
    pub value: Value,
}

/// One row of bindings live at a given point in the clause sequence.
#[derive(Debug, Clone, Default)]
pub struct Row {
    vars: HashMap<String, Binding>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn bind(&mut self, name: &str, kind: Kind, value: Value) {
        self.vars.insert(name.to_string(), Binding { kind, value });
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// `WITH a, b AS c` — builds a fresh row containing only the projected
    /// names, each carried forward at its original kind unless an expression
    /// produced a new scalar.
    pub fn project(&self, items: &[(String, Kind, Value)]) -> Row {
        let mut next = Row::new();
        for (name, kind, value) in items {
            next.bind(name, *kind, value.clone());
        }
        next
    }

    /// Builds a row from an already-materialized `(name, kind, value)` tuple
    /// — used to re-expose a projected WITH/RETURN row to WHERE/ORDER BY
    /// evaluation, which otherwise only ever sees a `Row` built by MATCH.
    pub fn from_tuple(tuple: &[(String, Kind, Value)]) -> Row {
        Row::new().project(tuple)
    }
}
