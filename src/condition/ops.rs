//! Leaf operator kinds and their pure comparison semantics (spec §4.1).
//!
//! `StringEquals`/`NumericEquals`/`Bool` from the spec's "Leaf ops" list share
//! one equality semantics that dispatches on the runtime type of the operand
//! values, so they collapse here into a single [`LeafOp::Equals`] (the wire
//! format never distinguishes them either, both translate to `eq`/`not_eq`).
//! See DESIGN.md for the full rationale.

use crate::value_objects::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeafOp {
    Equals,
    StringPrefix,
    StringContains,
    NumericGt,
    NumericGte,
    NumericLt,
    NumericLte,
    In,
    Any,
}

impl LeafOp {
    /// Parse an input-grammar op name (spec §3's `StringEquals`, `NumericGt`,
    /// `Bool`, etc., the distilled-spec leaf-op vocabulary, as opposed to the
    /// short translated names). Returns `(op, negated)`. The leading `!`
    /// marks negation; `Any` has no negated form.
    pub fn parse_wire_name(raw: &str) -> Option<(LeafOp, bool)> {
        let (negated, name) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let op = match name {
            "StringEquals" | "NumericEquals" | "Bool" => LeafOp::Equals,
            "StringPrefix" => LeafOp::StringPrefix,
            "StringContains" => LeafOp::StringContains,
            "NumericGt" => LeafOp::NumericGt,
            "NumericGte" => LeafOp::NumericGte,
            "NumericLt" => LeafOp::NumericLt,
            "NumericLte" => LeafOp::NumericLte,
            "In" => LeafOp::In,
            "Any" if !negated => LeafOp::Any,
            _ => return None,
        };
        Some((op, negated))
    }

    /// The short lowercase op name used by `Translate` (spec §4.1, §6).
    pub fn translated_name(self, negated: bool) -> &'static str {
        match (self, negated) {
            (LeafOp::Equals, false) => "eq",
            (LeafOp::Equals, true) => "not_eq",
            (LeafOp::StringPrefix, false) => "starts_with",
            (LeafOp::StringPrefix, true) => "not_starts_with",
            (LeafOp::StringContains, false) => "string_contains",
            (LeafOp::StringContains, true) => "not_string_contains",
            (LeafOp::NumericGt, false) => "gt",
            (LeafOp::NumericGt, true) => "not_gt",
            (LeafOp::NumericGte, false) => "gte",
            (LeafOp::NumericGte, true) => "not_gte",
            (LeafOp::NumericLt, false) => "lt",
            (LeafOp::NumericLt, true) => "not_lt",
            (LeafOp::NumericLte, false) => "lte",
            (LeafOp::NumericLte, true) => "not_lte",
            (LeafOp::In, false) => "in",
            (LeafOp::In, true) => "not_in",
            (LeafOp::Any, _) => "any",
        }
    }

    /// Whether this op is value-singleton-unwrapped by `Translate` when the
    /// value list has exactly one element. `In` is excluded per spec §4.1.
    pub fn unwraps_singleton_value(self) -> bool {
        !matches!(self, LeafOp::In | LeafOp::Any)
    }
}

/// Structural equality with numeric coercion: `Integer(5)` equals `Float(5.0)`.
/// Cross-kind comparisons (e.g. string vs number) are false, never an error
/// (spec §4.1: "type-mismatch between attribute and value kinds → false").
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => return x == y,
        _ => {}
    }
    a == b
}

fn string_prefix_matches(attr: &str, pattern: &str) -> bool {
    let stripped = pattern.strip_suffix('*').unwrap_or(pattern);
    match stripped.strip_suffix('/') {
        Some(dir) => attr.starts_with(stripped) || attr == dir,
        None => attr.starts_with(stripped),
    }
}

fn numeric_relates(attr: f64, values: &[Value], op: LeafOp) -> bool {
    let nums: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    if nums.is_empty() {
        return false;
    }
    match op {
        LeafOp::NumericGt => attr > nums.iter().cloned().fold(f64::INFINITY, f64::min),
        LeafOp::NumericGte => attr >= nums.iter().cloned().fold(f64::INFINITY, f64::min),
        LeafOp::NumericLt => attr < nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        LeafOp::NumericLte => attr <= nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        _ => unreachable!("numeric_relates called with non-numeric op"),
    }
}

/// Evaluate one op against a single (already list-unwrapped) attribute
/// element. The existential "any element of a list attribute" broadcasting
/// is the caller's job (see `condition::Leaf::eval`).
pub fn eval_positive(op: LeafOp, attr_elem: &Value, condition_values: &[Value]) -> bool {
    match op {
        LeafOp::Any => true,
        LeafOp::Equals | LeafOp::In => condition_values.iter().any(|v| values_equal(attr_elem, v)),
        LeafOp::StringPrefix => match attr_elem.as_str() {
            Some(s) => condition_values
                .iter()
                .filter_map(Value::as_str)
                .any(|p| string_prefix_matches(s, p)),
            None => false,
        },
        LeafOp::StringContains => match attr_elem.as_str() {
            Some(s) => condition_values
                .iter()
                .filter_map(Value::as_str)
                .any(|needle| s.contains(needle)),
            None => false,
        },
        LeafOp::NumericGt | LeafOp::NumericGte | LeafOp::NumericLt | LeafOp::NumericLte => {
            match attr_elem.as_f64() {
                Some(n) => numeric_relates(n, condition_values, op),
                None => false,
            }
        }
    }
}
