//! Scalar expression evaluation against a bound row. Aggregate functions
//! (count/sum/avg/min/max/collect) are recognised and evaluated by
//! `executor::project`, not here — this module only sees per-row scalars.

use std::collections::HashMap;

use crate::catalog::SchemaManager;
use crate::error::{GraphliteError, GraphliteResult};
use crate::parser::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::transform::scope::Row;
use crate::transform::value::Value;

pub const AGGREGATE_FUNCTIONS: &[&str] = &["count", "sum", "avg", "min", "max", "collect"];

pub struct EvalContext<'a> {
    pub mgr: &'a mut SchemaManager,
    pub row: &'a Row,
    pub params: &'a HashMap<String, Value>,
}

pub fn eval(ctx: &mut EvalContext, expr: &Expr) -> GraphliteResult<Value> {
    match expr {
        Expr::Literal(lit) => Ok(literal_value(lit)),
        Expr::Parameter(name) => Ok(ctx.params.get(name).cloned().unwrap_or(Value::Null)),
        Expr::Variable(name) => match ctx.row.get(name) {
            Some(binding) => Ok(binding.value.clone()),
            None => Err(GraphliteError::Semantic(format!("undefined variable `{name}`"))),
        },
        Expr::Property(inner, key) => {
            let base = eval(ctx, inner)?;
            property_of(ctx.mgr, &base, key)
        }
        Expr::Parenthesized(inner) => eval(ctx, inner),
        Expr::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for it in items {
                out.push(eval(ctx, it)?);
            }
            Ok(Value::List(out))
        }
        Expr::Map(entries) => {
            let mut out = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                out.push((k.clone(), eval(ctx, v)?));
            }
            Ok(Value::Map(out))
        }
        Expr::FunctionCall { name, args, .. } => call_function(ctx, name, args),
        Expr::Binary(op, lhs, rhs) => eval_binary(ctx, *op, lhs, rhs),
        Expr::Unary(op, inner) => eval_unary(ctx, *op, inner),
        Expr::IsNull(inner) => Ok(Value::Boolean(eval(ctx, inner)?.is_null())),
        Expr::IsNotNull(inner) => Ok(Value::Boolean(!eval(ctx, inner)?.is_null())),
        Expr::In(needle, haystack) => {
            let needle = eval(ctx, needle)?;
            match eval(ctx, haystack)? {
                Value::List(items) => Ok(Value::Boolean(items.iter().any(|v| values_equal(v, &needle)))),
                Value::Null => Ok(Value::Null),
                _ => Err(GraphliteError::Semantic("IN requires a list".to_string())),
            }
        }
        Expr::CaseSearched { branches, else_branch } => {
            for (cond, result) in branches {
                if eval(ctx, cond)?.is_truthy() == Some(true) {
                    return eval(ctx, result);
                }
            }
            match else_branch {
                Some(e) => eval(ctx, e),
                None => Ok(Value::Null),
            }
        }
        Expr::CaseSimple { subject, branches, else_branch } => {
            let subj = eval(ctx, subject)?;
            for (cmp, result) in branches {
                if values_equal(&eval(ctx, cmp)?, &subj) {
                    return eval(ctx, result);
                }
            }
            match else_branch {
                Some(e) => eval(ctx, e),
                None => Ok(Value::Null),
            }
        }
        Expr::ListIndex(list, index) => {
            let list = eval(ctx, list)?;
            let index = eval(ctx, index)?;
            match (list, index) {
                (Value::List(items), Value::Integer(i)) => {
                    let idx = normalize_index(i, items.len());
                    Ok(idx.and_then(|i| items.get(i).cloned()).unwrap_or(Value::Null))
                }
                _ => Ok(Value::Null),
            }
        }
        Expr::ListSlice(list, from, to) => {
            let list = eval(ctx, list)?;
            let Value::List(items) = list else { return Ok(Value::Null) };
            let n = items.len();
            let from = match from {
                Some(e) => match eval(ctx, e)? {
                    Value::Integer(i) => normalize_index(i, n).unwrap_or(0),
                    _ => 0,
                },
                None => 0,
            };
            let to = match to {
                Some(e) => match eval(ctx, e)? {
                    Value::Integer(i) => normalize_index(i, n).unwrap_or(n),
                    _ => n,
                },
                None => n,
            };
            if from >= to || from >= n {
                Ok(Value::List(Vec::new()))
            } else {
                Ok(Value::List(items[from..to.min(n)].to_vec()))
            }
        }
        Expr::MapProjection { variable, items } => map_projection(ctx, variable, items),
        Expr::PathFunctionCall { .. } => {
            Err(GraphliteError::Semantic("shortestPath()/allShortestPaths() only valid inside a pattern".to_string()))
        }
    }
}

fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let i = if i < 0 { i + len as i64 } else { i };
    if i < 0 || i as usize >= len {
        None
    } else {
        Some(i as usize)
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(i) => Value::Integer(*i),
        Literal::Float(f) => Value::Real(*f),
        Literal::String(s) => Value::Text(s.clone()),
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Null => Value::Null,
    }
}

/// `n.key` where `n` is a node/relationship: coalesced lookup across the
/// four typed tables via the plan-time-resolved key (§4.4's WHERE lowering).
/// `labels`/`type`/`id`/`keys` on the base value are also accepted here as a
/// convenience (Cypher allows `n.prop` and `labels(n)` to both reach `n`).
fn property_of(mgr: &mut SchemaManager, base: &Value, key: &str) -> GraphliteResult<Value> {
    match base {
        Value::Node(id) => Ok(Value::from_property(mgr.get_node_property(*id, key)?)),
        Value::Relationship(id) => Ok(Value::from_property(mgr.get_edge_property(*id, key)?)),
        Value::Map(entries) => Ok(entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()).unwrap_or(Value::Null)),
        Value::Null => Ok(Value::Null),
        _ => Err(GraphliteError::Semantic(format!("cannot access property `{key}` on a non-entity value"))),
    }
}

fn call_function(ctx: &mut EvalContext, name: &str, args: &[Expr]) -> GraphliteResult<Value> {
    let lower = name.to_ascii_lowercase();
    if AGGREGATE_FUNCTIONS.contains(&lower.as_str()) {
        return Err(GraphliteError::Semantic(format!(
            "aggregate function `{name}` is only valid directly in a RETURN/WITH projection"
        )));
    }
    let mut evaluated = Vec::with_capacity(args.len());
    for a in args {
        evaluated.push(eval(ctx, a)?);
    }
    match lower.as_str() {
        "labels" => match evaluated.first() {
            Some(Value::Node(id)) => Ok(Value::List(ctx.mgr.node_labels(*id)?.into_iter().map(Value::Text).collect())),
            _ => Err(GraphliteError::Semantic("labels() requires a node variable".to_string())),
        },
        "type" => match evaluated.first() {
            Some(Value::Relationship(id)) => Ok(ctx.mgr.edge_type(*id)?.map(Value::Text).unwrap_or(Value::Null)),
            _ => Err(GraphliteError::Semantic("type() requires a relationship variable".to_string())),
        },
        "id" => match evaluated.first() {
            Some(Value::Node(id)) | Some(Value::Relationship(id)) => Ok(Value::Integer(*id)),
            _ => Err(GraphliteError::Semantic("id() requires a node or relationship variable".to_string())),
        },
        "relationships" => match evaluated.first() {
            Some(Value::Map(entries)) => {
                Ok(entries.iter().find(|(k, _)| k == "relationships").map(|(_, v)| v.clone()).unwrap_or(Value::List(Vec::new())))
            }
            Some(Value::Null) | None => Ok(Value::Null),
            _ => Err(GraphliteError::Semantic("relationships() requires a path variable".to_string())),
        },
        "nodes" => match evaluated.first() {
            Some(Value::Map(entries)) => {
                Ok(entries.iter().find(|(k, _)| k == "nodes").map(|(_, v)| v.clone()).unwrap_or(Value::List(Vec::new())))
            }
            Some(Value::Null) | None => Ok(Value::Null),
            _ => Err(GraphliteError::Semantic("nodes() requires a path variable".to_string())),
        },
        "keys" => match evaluated.first() {
            Some(Value::Node(id)) => Ok(Value::List(ctx.mgr.node_keys(*id)?.into_iter().map(Value::Text).collect())),
            Some(Value::Relationship(id)) => Ok(Value::List(ctx.mgr.edge_keys(*id)?.into_iter().map(Value::Text).collect())),
            _ => Err(GraphliteError::Semantic("keys() requires a node or relationship variable".to_string())),
        },
        "coalesce" => Ok(evaluated.into_iter().find(|v| !v.is_null()).unwrap_or(Value::Null)),
        "tointeger" => Ok(match evaluated.first() {
            Some(Value::Integer(i)) => Value::Integer(*i),
            Some(Value::Real(r)) => Value::Integer(*r as i64),
            Some(Value::Text(s)) => s.trim().parse::<i64>().map(Value::Integer).unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        "tofloat" => Ok(match evaluated.first() {
            Some(Value::Integer(i)) => Value::Real(*i as f64),
            Some(Value::Real(r)) => Value::Real(*r),
            Some(Value::Text(s)) => s.trim().parse::<f64>().map(Value::Real).unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        "tostring" => Ok(match evaluated.first() {
            Some(Value::Text(s)) => Value::Text(s.clone()),
            Some(v) => v.render_cell().map(Value::Text).unwrap_or(Value::Null),
            None => Value::Null,
        }),
        "size" => Ok(match evaluated.first() {
            Some(Value::List(items)) => Value::Integer(items.len() as i64),
            Some(Value::Text(s)) => Value::Integer(s.chars().count() as i64),
            _ => Value::Null,
        }),
        "range" => {
            let start = evaluated.first().and_then(Value::as_f64).unwrap_or(0.0) as i64;
            let end = evaluated.get(1).and_then(Value::as_f64).unwrap_or(0.0) as i64;
            let step = evaluated.get(2).and_then(Value::as_f64).unwrap_or(1.0) as i64;
            let step = if step == 0 { 1 } else { step };
            let mut out = Vec::new();
            let mut i = start;
            if step > 0 {
                while i <= end {
                    out.push(Value::Integer(i));
                    i += step;
                }
            } else {
                while i >= end {
                    out.push(Value::Integer(i));
                    i += step;
                }
            }
            Ok(Value::List(out))
        }
        "abs" => Ok(match evaluated.first() {
            Some(Value::Integer(i)) => Value::Integer(i.abs()),
            Some(Value::Real(r)) => Value::Real(r.abs()),
            _ => Value::Null,
        }),
        "toupper" => Ok(match evaluated.first() {
            Some(Value::Text(s)) => Value::Text(s.to_uppercase()),
            _ => Value::Null,
        }),
        "tolower" => Ok(match evaluated.first() {
            Some(Value::Text(s)) => Value::Text(s.to_lowercase()),
            _ => Value::Null,
        }),
        _ => Err(GraphliteError::Semantic(format!("unknown function `{name}`"))),
    }
}

fn map_projection(
    ctx: &mut EvalContext,
    variable: &str,
    items: &[crate::parser::ast::MapProjectionItem],
) -> GraphliteResult<Value> {
    use crate::parser::ast::MapProjectionItem;
    let base = match ctx.row.get(variable) {
        Some(b) => b.value.clone(),
        None => return Err(GraphliteError::Semantic(format!("undefined variable `{variable}`"))),
    };
    let mut out = Vec::new();
    for item in items {
        match item {
            MapProjectionItem::Property(key) => {
                out.push((key.clone(), property_of(ctx.mgr, &base, key)?));
            }
            MapProjectionItem::Alias { key, expr } => {
                out.push((key.clone(), eval(ctx, expr)?));
            }
            MapProjectionItem::AllProperties => {
                if let Value::Node(id) = base {
                    for key in ctx.mgr.node_keys(id)? {
                        let v = Value::from_property(ctx.mgr.get_node_property(id, &key)?);
                        out.push((key, v));
                    }
                }
            }
        }
    }
    Ok(Value::Map(out))
}

pub fn values_equal(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    a.partial_cmp_value(b) == Some(std::cmp::Ordering::Equal)
}

fn eval_binary(ctx: &mut EvalContext, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> GraphliteResult<Value> {
    // AND/OR short-circuit and tolerate NULL per Kleene three-valued logic.
    if op == BinaryOp::And {
        let l = eval(ctx, lhs)?;
        if l.is_truthy() == Some(false) {
            return Ok(Value::Boolean(false));
        }
        let r = eval(ctx, rhs)?;
        if r.is_truthy() == Some(false) {
            return Ok(Value::Boolean(false));
        }
        return Ok(if l.is_null() || r.is_null() { Value::Null } else { Value::Boolean(true) });
    }
    if op == BinaryOp::Or {
        let l = eval(ctx, lhs)?;
        if l.is_truthy() == Some(true) {
            return Ok(Value::Boolean(true));
        }
        let r = eval(ctx, rhs)?;
        if r.is_truthy() == Some(true) {
            return Ok(Value::Boolean(true));
        }
        return Ok(if l.is_null() || r.is_null() { Value::Null } else { Value::Boolean(false) });
    }

    let l = eval(ctx, lhs)?;
    let r = eval(ctx, rhs)?;
    if (l.is_null() || r.is_null()) && !matches!(op, BinaryOp::Eq | BinaryOp::Neq) {
        return Ok(Value::Null);
    }

    match op {
        BinaryOp::Add => arith(&l, &r, |a, b| a + b, |a, b| a.wrapping_add(b), Some(string_concat(&l, &r))),
        BinaryOp::Sub => arith(&l, &r, |a, b| a - b, i64::wrapping_sub, None),
        BinaryOp::Mul => arith(&l, &r, |a, b| a * b, i64::wrapping_mul, None),
        BinaryOp::Div => {
            if let (Value::Integer(a), Value::Integer(b)) = (&l, &r) {
                if *b == 0 {
                    return Err(GraphliteError::Semantic("division by zero".to_string()));
                }
                return Ok(Value::Integer(a / b));
            }
            let (a, b) = (l.as_f64(), r.as_f64());
            match (a, b) {
                (Some(a), Some(b)) => Ok(Value::Real(a / b)),
                _ => Ok(Value::Null),
            }
        }
        BinaryOp::Mod => match (&l, &r) {
            (Value::Integer(a), Value::Integer(b)) if *b != 0 => Ok(Value::Integer(a % b)),
            _ => Ok(Value::Null),
        },
        BinaryOp::Pow => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Real(a.powf(b))),
            _ => Ok(Value::Null),
        },
        BinaryOp::Eq => Ok(if l.is_null() || r.is_null() { Value::Null } else { Value::Boolean(values_equal(&l, &r)) }),
        BinaryOp::Neq => Ok(if l.is_null() || r.is_null() { Value::Null } else { Value::Boolean(!values_equal(&l, &r)) }),
        BinaryOp::Lt => cmp(&l, &r, |o| o == std::cmp::Ordering::Less),
        BinaryOp::Le => cmp(&l, &r, |o| o != std::cmp::Ordering::Greater),
        BinaryOp::Gt => cmp(&l, &r, |o| o == std::cmp::Ordering::Greater),
        BinaryOp::Ge => cmp(&l, &r, |o| o != std::cmp::Ordering::Less),
        BinaryOp::Xor => match (l.is_truthy(), r.is_truthy()) {
            (Some(a), Some(b)) => Ok(Value::Boolean(a ^ b)),
            _ => Ok(Value::Null),
        },
        BinaryOp::StartsWith => str_pred(&l, &r, |a, b| a.starts_with(b)),
        BinaryOp::EndsWith => str_pred(&l, &r, |a, b| a.ends_with(b)),
        BinaryOp::Contains => str_pred(&l, &r, |a, b| a.contains(b)),
        BinaryOp::RegexMatch => Err(GraphliteError::Semantic("=~ regex matching is not supported".to_string())),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn string_concat(l: &Value, r: &Value) -> Value {
    if let (Value::List(a), Value::List(b)) = (l, r) {
        let mut out = a.clone();
        out.extend(b.clone());
        return Value::List(out);
    }
    Value::Null
}

fn arith(
    l: &Value,
    r: &Value,
    f64_op: impl Fn(f64, f64) -> f64,
    i64_op: impl Fn(i64, i64) -> i64,
    list_fallback: Option<Value>,
) -> GraphliteResult<Value> {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(i64_op(*a, *b))),
        (Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{a}{b}"))),
        (Value::List(_), Value::List(_)) => Ok(list_fallback.unwrap_or(Value::Null)),
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Real(f64_op(a, b))),
            _ => Ok(Value::Null),
        },
    }
}

fn cmp(l: &Value, r: &Value, pred: impl Fn(std::cmp::Ordering) -> bool) -> GraphliteResult<Value> {
    match l.partial_cmp_value(r) {
        Some(o) => Ok(Value::Boolean(pred(o))),
        None => Ok(Value::Null),
    }
}

fn str_pred(l: &Value, r: &Value, pred: impl Fn(&str, &str) -> bool) -> GraphliteResult<Value> {
    match (l, r) {
        (Value::Text(a), Value::Text(b)) => Ok(Value::Boolean(pred(a, b))),
        _ => Ok(Value::Null),
    }
}

fn eval_unary(ctx: &mut EvalContext, op: UnaryOp, inner: &Expr) -> GraphliteResult<Value> {
    let v = eval(ctx, inner)?;
    match op {
        UnaryOp::Pos => Ok(v),
        UnaryOp::Neg => Ok(match v {
            Value::Integer(i) => Value::Integer(-i),
            Value::Real(r) => Value::Real(-r),
            _ => Value::Null,
        }),
        UnaryOp::Not => Ok(match v.is_truthy() {
            Some(b) => Value::Boolean(!b),
            None => Value::Null,
        }),
    }
}
