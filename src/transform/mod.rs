//! Query transform: turns a parsed [`Query`] into rows, interpreting MATCH
//! patterns, expressions, and write clauses directly against
//! [`SchemaManager`] rather than lowering to SQL text — see DESIGN.md for why
//! this departs from a literal CTE-emitting pipeline.

pub mod algorithm_detect;
pub mod eval;
pub mod pattern;
pub mod project;
pub mod scope;
pub mod value;
pub mod write;

use std::collections::HashMap;

use crate::catalog::SchemaManager;
use crate::config::EngineConfig;
use crate::error::{GraphliteError, GraphliteResult};
use crate::parser::ast::{MatchClause, Query, ReadingClause, SinglePartQuery};
use crate::transform::eval::{eval, EvalContext};
use crate::transform::project::Projection;
use crate::transform::scope::Row;
use crate::transform::value::Value;
use crate::transform::write::Counters;

pub struct ExecutionResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub counters: Counters,
}

pub fn execute(mgr: &mut SchemaManager, config: &EngineConfig, query: &Query, params: &HashMap<String, Value>) -> GraphliteResult<ExecutionResult> {
    if let Some(call) = algorithm_detect::detect(query)? {
        let json = crate::algorithms::run(mgr.connection(), &call)?;
        let column = query.parts[0]
            .return_clause
            .as_ref()
            .map(|r| project::column_name(&r.items[0]))
            .unwrap_or_else(|| call.function_name().to_string());
        return Ok(ExecutionResult { columns: vec![column], rows: vec![vec![Value::Text(json)]], counters: Counters::default() });
    }

    let (columns, rows, counters) = run_part_chain(mgr, config, &query.parts, params)?;
    if query.unions.is_empty() {
        return Ok(ExecutionResult { columns, rows, counters });
    }

    let mut all_rows = rows;
    let mut combined_counters = counters;
    for union in &query.unions {
        let (_, more_rows, more_counters) = run_part_chain(mgr, config, &union.parts, params)?;
        all_rows.extend(more_rows);
        combined_counters.merge(more_counters);
        if !union.all {
            dedupe_rows(&mut all_rows);
        }
    }
    Ok(ExecutionResult { columns, rows: all_rows, counters: combined_counters })
}

fn dedupe_rows(rows: &mut Vec<Vec<Value>>) {
    let mut seen: Vec<Vec<String>> = Vec::new();
    rows.retain(|row| {
        let key: Vec<String> = row.iter().map(|v| v.to_json()).collect();
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
}

fn run_part_chain(
    mgr: &mut SchemaManager,
    config: &EngineConfig,
    parts: &[SinglePartQuery],
    params: &HashMap<String, Value>,
) -> GraphliteResult<(Vec<String>, Vec<Vec<Value>>, Counters)> {
    let mut rows = vec![Row::new()];
    let mut counters = Counters::default();

    for part in parts {
        for reading in &part.reading_clauses {
            rows = match reading {
                ReadingClause::Match(m) => apply_match(mgr, config, m, rows, params, false)?,
                ReadingClause::OptionalMatch(m) => apply_match(mgr, config, m, rows, params, true)?,
                ReadingClause::Unwind(u) => write::execute_unwind(mgr, &u.expr, &u.alias, rows, params)?,
                ReadingClause::Call(c) => return Err(GraphliteError::UnknownProcedure(c.procedure_name.clone())),
            };
        }
        for updating in &part.updating_clauses {
            rows = write::execute_updating_clause(mgr, config, updating, rows, params, &mut counters)?;
        }
        if let Some(with) = &part.with {
            let spec = Projection {
                items: &with.items,
                where_clause: with.where_clause.as_ref(),
                order_by: with.order_by.as_deref(),
                skip: with.skip.as_ref(),
                limit: with.limit.as_ref(),
                distinct: with.distinct,
            };
            let tuples = project::run(mgr, rows, &spec, params)?;
            rows = tuples.iter().map(|t| Row::from_tuple(t)).collect();
        }
        if let Some(ret) = &part.return_clause {
            let spec = Projection {
                items: &ret.items,
                where_clause: None,
                order_by: ret.order_by.as_deref(),
                skip: ret.skip.as_ref(),
                limit: ret.limit.as_ref(),
                distinct: ret.distinct,
            };
            let tuples = project::run(mgr, rows, &spec, params)?;
            let columns = ret.items.iter().map(project::column_name).collect();
            let values = tuples.into_iter().map(|t| t.into_iter().map(|(_, _, v)| v).collect()).collect();
            return Ok((columns, values, counters));
        }
    }
    Ok((Vec::new(), Vec::new(), counters))
}

fn apply_match(
    mgr: &mut SchemaManager,
    config: &EngineConfig,
    clause: &MatchClause,
    base_rows: Vec<Row>,
    params: &HashMap<String, Value>,
    optional: bool,
) -> GraphliteResult<Vec<Row>> {
    let mut rows = base_rows;
    for pattern in &clause.patterns {
        rows = pattern::match_pattern(mgr, config, pattern, rows, params, optional)?;
    }
    if let Some(where_expr) = &clause.where_clause {
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            let keep = {
                let mut ctx = EvalContext { mgr, row: &row, params };
                eval(&mut ctx, where_expr)?.is_truthy() == Some(true)
            };
            if keep {
                kept.push(row);
            }
        }
        rows = kept;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> SchemaManager {
        let conn = Connection::open_in_memory().unwrap();
        let mut mgr = SchemaManager::new(conn, 64);
        mgr.initialize().unwrap();
        mgr
    }

    fn run_query(mgr: &mut SchemaManager, query_text: &str) -> ExecutionResult {
        let query = crate::parser::parse_query(query_text).expect("parses");
        execute(mgr, &EngineConfig::default(), &query, &HashMap::new()).expect("executes")
    }

    #[test]
    fn create_then_match_return_roundtrips_a_property() {
        let mut mgr = setup();
        run_query(&mut mgr, "CREATE (n:Person {name: 'Ada', age: 30})");
        let result = run_query(&mut mgr, "MATCH (n:Person) RETURN n.name, n.age");
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0][0], Value::Text("Ada".to_string()));
        assert_eq!(result.rows[0][1], Value::Integer(30));
    }

    #[test]
    fn with_preserves_node_kind_across_boundary() {
        let mut mgr = setup();
        run_query(&mut mgr, "CREATE (n:Person {name: 'Ada'})");
        let result = run_query(&mut mgr, "MATCH (n:Person) WITH n RETURN n.name");
        assert_eq!(result.rows[0][0], Value::Text("Ada".to_string()));
    }

    #[test]
    fn where_filters_numeric_range_and_order_by_sorts() {
        let mut mgr = setup();
        run_query(&mut mgr, "CREATE (a:Person {name: 'A', age: 25})");
        run_query(&mut mgr, "CREATE (b:Person {name: 'B', age: 32})");
        run_query(&mut mgr, "CREATE (c:Person {name: 'C', age: 45})");
        let result = run_query(&mut mgr, "MATCH (n:Person) WHERE n.age > 28 AND n.age < 40 RETURN n.name ORDER BY n.name");
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0][0], Value::Text("B".to_string()));
    }

    #[test]
    fn remove_then_return_is_null() {
        let mut mgr = setup();
        run_query(&mut mgr, "CREATE (n:Person {name: 'Ada', age: 30})");
        run_query(&mut mgr, "MATCH (n:Person) REMOVE n.age");
        let result = run_query(&mut mgr, "MATCH (n:Person) RETURN n.age");
        assert_eq!(result.rows[0][0], Value::Null);
    }

    #[test]
    fn count_aggregate_groups_by_label_count() {
        let mut mgr = setup();
        run_query(&mut mgr, "CREATE (a:Person {name: 'A'})");
        run_query(&mut mgr, "CREATE (b:Person {name: 'B'})");
        let result = run_query(&mut mgr, "MATCH (n:Person) RETURN count(n) AS total");
        assert_eq!(result.rows[0][0], Value::Integer(2));
    }
}
