//! Detects a native graph-algorithm call in a RETURN projection, per the
//! teacher's function-name dispatch in
//! `examples/genezhang-clickgraph/src/clickhouse_query_generator/function_registry.rs`.
//!
//! A query qualifies when its sole RETURN item is a direct call to one of
//! `algorithms::KNOWN_FUNCTIONS` with no preceding MATCH/WHERE — the engine
//! answers the call from the CSR snapshot instead of lowering to row
//! evaluation.

use crate::algorithms::{self, AlgorithmCall};
use crate::error::{GraphliteError, GraphliteResult};
use crate::parser::ast::{Expr, Literal, Query};

pub fn detect(query: &Query) -> GraphliteResult<Option<AlgorithmCall>> {
    if query.parts.len() != 1 || !query.unions.is_empty() {
        return Ok(None);
    }
    let part = &query.parts[0];
    if !part.reading_clauses.is_empty() || !part.updating_clauses.is_empty() || part.with.is_some() {
        return Ok(None);
    }
    let Some(ret) = &part.return_clause else { return Ok(None) };
    if ret.items.len() != 1 {
        return Ok(None);
    }
    let Expr::FunctionCall { name, args, .. } = &ret.items[0].expr else { return Ok(None) };
    if !algorithms::is_known_algorithm_function(name) {
        return Ok(None);
    }
    build_call(&name.to_ascii_lowercase(), args).map(Some)
}

fn str_arg(args: &[Expr], idx: usize) -> GraphliteResult<String> {
    match args.get(idx) {
        Some(Expr::Literal(Literal::String(s))) => Ok(s.clone()),
        _ => Err(GraphliteError::Semantic(format!("expected a string literal argument at position {idx}"))),
    }
}

fn opt_str_arg(args: &[Expr], idx: usize) -> Option<String> {
    match args.get(idx) {
        Some(Expr::Literal(Literal::String(s))) => Some(s.clone()),
        _ => None,
    }
}

fn f64_arg(args: &[Expr], idx: usize, default: f64) -> f64 {
    match args.get(idx) {
        Some(Expr::Literal(Literal::Float(f))) => *f,
        Some(Expr::Literal(Literal::Integer(i))) => *i as f64,
        _ => default,
    }
}

fn u32_arg(args: &[Expr], idx: usize, default: u32) -> u32 {
    match args.get(idx) {
        Some(Expr::Literal(Literal::Integer(i))) => *i as u32,
        _ => default,
    }
}

fn usize_arg(args: &[Expr], idx: usize, default: usize) -> usize {
    match args.get(idx) {
        Some(Expr::Literal(Literal::Integer(i))) => *i as usize,
        _ => default,
    }
}

fn opt_i64_arg(args: &[Expr], idx: usize) -> Option<i64> {
    match args.get(idx) {
        Some(Expr::Literal(Literal::Integer(i))) => Some(*i),
        _ => None,
    }
}

/// Damping factor is a probability mass split (spec: "any real, runtime
/// checks non-negativity") — reject negative values up front rather than
/// feeding them into the power iteration.
fn validate_damping(damping: f64) -> GraphliteResult<f64> {
    if damping < 0.0 {
        return Err(GraphliteError::Semantic(format!("damping factor must be non-negative, got {damping}")));
    }
    Ok(damping)
}

fn build_call(name: &str, args: &[Expr]) -> GraphliteResult<AlgorithmCall> {
    const DEFAULT_DAMPING: f64 = 0.85;
    const DEFAULT_ITERATIONS: u32 = 20;

    Ok(match name {
        "pagerank" => AlgorithmCall::PageRank {
            damping: validate_damping(f64_arg(args, 0, DEFAULT_DAMPING))?,
            max_iterations: algorithms::clamp_iterations(u32_arg(args, 1, DEFAULT_ITERATIONS)),
        },
        "toppagerank" => AlgorithmCall::TopPageRank {
            k: algorithms::clamp_top_k(usize_arg(args, 0, 10)),
            damping: validate_damping(f64_arg(args, 1, DEFAULT_DAMPING))?,
            max_iterations: algorithms::clamp_iterations(u32_arg(args, 2, DEFAULT_ITERATIONS)),
        },
        "personalizedpagerank" => {
            let seeds = match args.first() {
                Some(Expr::List(items)) => items
                    .iter()
                    .filter_map(|e| if let Expr::Literal(Literal::String(s)) = e { Some(s.clone()) } else { None })
                    .collect(),
                _ => Vec::new(),
            };
            AlgorithmCall::PersonalizedPageRank {
                seeds,
                damping: validate_damping(f64_arg(args, 1, DEFAULT_DAMPING))?,
                max_iterations: algorithms::clamp_iterations(u32_arg(args, 2, DEFAULT_ITERATIONS)),
            }
        }
        "labelpropagation" => AlgorithmCall::LabelPropagation,
        "louvain" => AlgorithmCall::Louvain { resolution: f64_arg(args, 0, 1.0) },
        "wcc" => AlgorithmCall::Wcc,
        "scc" => AlgorithmCall::Scc,
        "betweennesscentrality" => AlgorithmCall::BetweennessCentrality,
        "closenesscentrality" => AlgorithmCall::ClosenessCentrality,
        "eigenvectorcentrality" => AlgorithmCall::EigenvectorCentrality,
        "degreecentrality" => AlgorithmCall::DegreeCentrality,
        "dijkstra" => AlgorithmCall::Dijkstra {
            source: str_arg(args, 0)?,
            target: str_arg(args, 1)?,
            weight_prop: opt_str_arg(args, 2),
        },
        "astar" => AlgorithmCall::AStar {
            source: str_arg(args, 0)?,
            target: str_arg(args, 1)?,
            weight_prop: opt_str_arg(args, 2),
        },
        "apsp" | "allpairsshortestpath" => AlgorithmCall::Apsp,
        "bfs" => AlgorithmCall::Bfs { source: str_arg(args, 0)?, max_depth: opt_i64_arg(args, 1) },
        "dfs" => AlgorithmCall::Dfs { source: str_arg(args, 0)?, max_depth: opt_i64_arg(args, 1) },
        "trianglecount" => AlgorithmCall::TriangleCount,
        "nodesimilarity" => {
            let pair = match (opt_str_arg(args, 0), opt_str_arg(args, 1)) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            };
            AlgorithmCall::NodeSimilarity { pair, threshold: None, top_k: None }
        }
        "knn" => AlgorithmCall::Knn { source: str_arg(args, 0)?, k: usize_arg(args, 1, 5) },
        other => return Err(GraphliteError::Semantic(format!("unrecognized algorithm function `{other}`"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::*;

    fn simple_return(expr: Expr) -> Query {
        Query {
            parts: vec![SinglePartQuery {
                reading_clauses: vec![],
                updating_clauses: vec![],
                with: None,
                return_clause: Some(ReturnClause {
                    distinct: false,
                    items: vec![ProjectionItem { expr, alias: None, original_text: String::new() }],
                    order_by: None,
                    skip: None,
                    limit: None,
                }),
            }],
            unions: vec![],
        }
    }

    #[test]
    fn detects_pagerank_with_defaults() {
        let q = simple_return(Expr::FunctionCall { name: "pageRank".into(), distinct: false, args: vec![] });
        let call = detect(&q).unwrap().unwrap();
        assert_eq!(call, AlgorithmCall::PageRank { damping: 0.85, max_iterations: 20 });
    }

    #[test]
    fn non_algorithm_function_is_not_detected() {
        let q = simple_return(Expr::FunctionCall { name: "count".into(), distinct: false, args: vec![] });
        assert!(detect(&q).unwrap().is_none());
    }

    #[test]
    fn match_preceding_return_disqualifies_detection() {
        let mut q = simple_return(Expr::FunctionCall { name: "pageRank".into(), distinct: false, args: vec![] });
        q.parts[0].reading_clauses.push(ReadingClause::Match(MatchClause { patterns: vec![], where_clause: None }));
        assert!(detect(&q).unwrap().is_none());
    }

    #[test]
    fn negative_damping_is_rejected() {
        let q = simple_return(Expr::FunctionCall {
            name: "pageRank".into(),
            distinct: false,
            args: vec![Expr::Literal(Literal::Float(-1.0))],
        });
        assert!(detect(&q).is_err());
    }
}
