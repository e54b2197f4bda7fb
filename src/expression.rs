//! Expression parsing (C2): turns a stored policy's `expression` string
//! (a JSON array of per-resource-type fragments) into condition trees,
//! validating the wire grammar along the way (spec §3, §6).

use crate::condition::ops::LeafOp;
use crate::condition::{Condition, Leaf};
use crate::error::PdpError;
use crate::value_objects::Value;
use serde::Deserialize;
use serde_json::Value as Json;

const OP: &str = "op";
const FIELD: &str = "field";
const VALUE: &str = "value";
const CONTENT: &str = "content";

/// One `{system, type, expression}` element of a policy's expression array
/// (spec §3), with its `expression` already parsed into a `Condition`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub system: String,
    pub r#type: String,
    pub condition: Condition,
}

/// A parsed policy expression: one fragment per resource-type the policy
/// references.
pub type PolicyExpression = Vec<Fragment>;

#[derive(Deserialize)]
struct RawFragment {
    system: String,
    r#type: String,
    expression: Json,
}

/// Parse one stored policy's `expression` string into its fragments.
/// `policy_id` is carried only for error attribution.
pub fn parse(op: &'static str, policy_id: i64, expression: &str) -> Result<PolicyExpression, PdpError> {
    let raw: Vec<RawFragment> = serde_json::from_str(expression)
        .map_err(|e| PdpError::parse_error(op, policy_id.to_string(), format!("invalid JSON: {e}")))?;

    raw.into_iter()
        .map(|f| {
            Ok(Fragment {
                system: f.system,
                r#type: f.r#type,
                condition: parse_condition(op, policy_id, &f.expression)?,
            })
        })
        .collect()
}

/// Combine the fragments applicable to a policy into a single `Condition`
/// for evaluation or translation. When `resource_types` is `Some`, only
/// fragments whose `(system, type)` appears in it are kept (spec §4.5's
/// translator filtering); when `None`, every fragment participates (the
/// evaluator's case, since the request's resources were already validated
/// against the action's resource types by the entrance facade). Multiple
/// surviving fragments are AND-combined (spec §9's open-question
/// resolution). Returns `None` when no fragment survives the filter.
pub fn combine(fragments: &[Fragment], resource_types: Option<&[(String, String)]>) -> Option<Condition> {
    let matching: Vec<Condition> = fragments
        .iter()
        .filter(|f| match resource_types {
            Some(types) => types.iter().any(|(s, t)| *s == f.system && *t == f.r#type),
            None => true,
        })
        .map(|f| f.condition.clone())
        .collect();

    match matching.len() {
        0 => None,
        1 => Some(matching.into_iter().next().unwrap()),
        _ => Some(Condition::And(matching)),
    }
}

fn parse_condition(op: &'static str, policy_id: i64, node: &Json) -> Result<Condition, PdpError> {
    let obj = node.as_object().ok_or_else(|| {
        PdpError::parse_error(op, policy_id.to_string(), "expected a JSON object at this node")
    })?;

    let op_name = obj
        .get(OP)
        .and_then(Json::as_str)
        .ok_or_else(|| PdpError::parse_error(op, policy_id.to_string(), "missing \"op\" field"))?;

    match op_name {
        "AND" | "OR" => parse_combinator(op, policy_id, op_name, obj),
        _ => parse_leaf(op, policy_id, op_name, obj),
    }
}

fn parse_combinator(
    op: &'static str,
    policy_id: i64,
    op_name: &str,
    obj: &serde_json::Map<String, Json>,
) -> Result<Condition, PdpError> {
    let content = obj
        .get(CONTENT)
        .and_then(Json::as_array)
        .ok_or_else(|| {
            PdpError::parse_error(op, policy_id.to_string(), format!("\"{op_name}\" missing \"content\" array"))
        })?;

    if content.is_empty() {
        return Err(PdpError::parse_error(
            op,
            policy_id.to_string(),
            format!("\"{op_name}\" has an empty \"content\" array"),
        ));
    }

    let children: Result<Vec<Condition>, PdpError> = content
        .iter()
        .map(|child| parse_condition(op, policy_id, child))
        .collect();
    let children = children?;

    Ok(match op_name {
        "AND" => Condition::And(children),
        "OR" => Condition::Or(children),
        _ => unreachable!("parse_combinator called with non-combinator op name"),
    })
}

fn parse_leaf(
    op: &'static str,
    policy_id: i64,
    op_name: &str,
    obj: &serde_json::Map<String, Json>,
) -> Result<Condition, PdpError> {
    let (leaf_op, negated) = LeafOp::parse_wire_name(op_name).ok_or_else(|| {
        PdpError::parse_error(op, policy_id.to_string(), format!("unknown leaf op \"{op_name}\""))
    })?;

    if leaf_op == LeafOp::Any {
        return Ok(Condition::Leaf(Leaf::any()));
    }

    let field = obj
        .get(FIELD)
        .and_then(Json::as_str)
        .ok_or_else(|| {
            PdpError::parse_error(op, policy_id.to_string(), format!("\"{op_name}\" missing \"field\""))
        })?;

    let raw_value = obj.get(VALUE).ok_or_else(|| {
        PdpError::parse_error(op, policy_id.to_string(), format!("\"{op_name}\" missing \"value\""))
    })?;

    let value: Value = serde_json::from_value(raw_value.clone()).map_err(|e| {
        PdpError::parse_error(op, policy_id.to_string(), format!("invalid \"value\": {e}"))
    })?;
    let values = match value {
        Value::List(items) => items,
        scalar => vec![scalar],
    };

    Ok(Condition::Leaf(Leaf::new(leaf_op, negated, field, values)))
}
