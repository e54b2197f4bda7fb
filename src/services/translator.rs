//! Translator (C6): walks a (possibly partially evaluated) condition tree
//! into a portable operator/field/value JSON (spec §4.5).

use crate::condition::Condition;
use crate::entities::AuthPolicy;
use crate::error::PdpError;
use serde_json::json;

/// `PoliciesTranslate`: combine the already-filtered, already-simplified
/// per-policy conditions (the output of
/// [`crate::services::driver::EvalDriver::filter_policies`]) into the
/// single portable residual JSON for a decision (spec §4.5).
///
/// - 0 policies → `{}` (the caller treats this as "no access", spec §4.6's
///   `EmptyPolicies`).
/// - 1 policy → its translated expression, unwrapped.
/// - N policies → `{"op":"OR","content":[…]}` in input order.
pub fn translate_policies(policies: &[(AuthPolicy, Condition)]) -> Result<serde_json::Value, PdpError> {
    match policies.len() {
        0 => Ok(json!({})),
        1 => policies[0].1.translate(),
        _ => {
            let content: Result<Vec<_>, _> = policies.iter().map(|(_, c)| c.translate()).collect();
            Ok(json!({ "op": "OR", "content": content? }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ops::LeafOp;
    use crate::condition::Leaf;
    use crate::value_objects::{PolicyId, Value};

    fn policy(id: i64) -> AuthPolicy {
        AuthPolicy {
            id: PolicyId(id),
            version: 1,
            expression: "[]".to_string(),
            expression_signature: format!("sig-{id}"),
            expired_at: i64::MAX,
        }
    }

    fn eq_leaf(key: &str, v: &str) -> Condition {
        Condition::Leaf(Leaf::new(LeafOp::Equals, false, key, vec![Value::from(v)]))
    }

    #[test]
    fn empty_translates_to_empty_object() {
        let out = translate_policies(&[]).unwrap();
        assert_eq!(out, json!({}));
    }

    #[test]
    fn single_policy_unwraps() {
        let out = translate_policies(&[(policy(1), eq_leaf("bk_cmdb.host.env", "prod"))]).unwrap();
        assert_eq!(out["op"], "eq");
        assert_eq!(out["value"], "prod");
    }

    #[test]
    fn multiple_policies_or_combine() {
        let out = translate_policies(&[
            (policy(1), eq_leaf("bk_cmdb.host.env", "prod")),
            (policy(2), eq_leaf("bk_cmdb.host.env", "stage")),
        ])
        .unwrap();
        assert_eq!(out["op"], "OR");
        assert_eq!(out["content"].as_array().unwrap().len(), 2);
    }
}
