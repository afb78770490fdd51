//! Runtime values produced while evaluating expressions against bound rows.

use std::cmp::Ordering;

use crate::catalog::PropertyValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Node,
    Relationship,
    Path,
    Scalar,
    List,
    Map,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Null,
    /// A bound node, carried by rowid so property access stays live.
    Node(i64),
    /// A bound relationship, carried by rowid.
    Relationship(i64),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Node(_) => Kind::Node,
            Value::Relationship(_) => Kind::Relationship,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            _ => Kind::Scalar,
        }
    }

    pub fn from_property(v: Option<PropertyValue>) -> Value {
        match v {
            None => Value::Null,
            Some(PropertyValue::Integer(i)) => Value::Integer(i),
            Some(PropertyValue::Real(r)) => Value::Real(r),
            Some(PropertyValue::Text(t)) => Value::Text(t),
            Some(PropertyValue::Boolean(b)) => Value::Boolean(b),
        }
    }

    pub fn to_property(&self) -> Option<PropertyValue> {
        match self {
            Value::Integer(i) => Some(PropertyValue::Integer(*i)),
            Value::Real(r) => Some(PropertyValue::Real(*r)),
            Value::Text(t) => Some(PropertyValue::Text(t.clone())),
            Value::Boolean(b) => Some(PropertyValue::Boolean(*b)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Null => None,
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Cell rendering for the Core API's `data[row][col]` text cells (§6:
    /// "Every string is null-terminated text").
    pub fn render_cell(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Text(t) => Some(t.clone()),
            Value::Node(_) | Value::Relationship(_) | Value::List(_) | Value::Map(_) => {
                Some(self.to_json())
            }
        }
    }

    pub fn to_json(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => crate::json::json_number(*r),
            Value::Boolean(b) => b.to_string(),
            Value::Text(t) => crate::json::json_string(t),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_json()).collect();
                format!("[{}]", parts.join(","))
            }
            Value::Map(entries) => {
                let parts: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{}:{}", crate::json::json_string(k), v.to_json())).collect();
                format!("{{{}}}", parts.join(","))
            }
            Value::Node(id) | Value::Relationship(id) => format!("{{\"id\":{id}}}"),
        }
    }

    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Real(b)) => (*a as f64).partial_cmp(b),
            (Value::Real(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}
