//! Value objects for the policy decision point.
//!
//! These are immutable data shapes shared by the condition algebra, the
//! attribute context, and the translator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub i64);

impl std::fmt::Display for PolicyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attribute value, scalar or list-valued. A list means "any of these"
/// wherever the condition algebra reads it (existential semantics over lists
/// per spec §3's ExprContext).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// View this value as a slice of scalars for existential matching: a
    /// scalar is treated as a single-element list, a list is iterated as-is.
    pub fn as_elements(&self) -> Vec<&Value> {
        match self {
            Value::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Coerce to f64 for numeric comparisons. Type mismatches (e.g. a string
    /// attribute compared numerically) return `None`, which the numeric ops
    /// treat as "does not match" rather than an error (spec §4.1).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// A fully-qualified attribute key, always `{system}.{type}.{attribute}` for
/// resource attributes, or `iam.subject.*` / `iam.action.*` for subject and
/// action attributes (spec §4.3).
pub type AttrKey = String;

/// Identifies a PK in the subject/department/group space (spec §3's
/// "effective subject PKs").
pub type Pk = i64;

/// Opaque request correlation id, used only for tracing spans.
pub fn new_request_id() -> Uuid {
    Uuid::now_v7()
}
