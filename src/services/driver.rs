//! Evaluation driver (C4): orchestrates full evaluation and filter-evaluation
//! over a policy set (spec §4.4).

use crate::cache::ExpressionCache;
use crate::condition::Condition;
use crate::context::ExprContext;
use crate::entities::AuthPolicy;
use crate::error::PdpError;
use crate::expression;
use crate::value_objects::PolicyId;

/// Result of a full evaluation: either a policy matched, or none did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow { policy_id: PolicyId },
    Deny,
}

/// Thin wrapper around the expression cache that implements `EvalPolicies`
/// and `FilterPolicies` (spec §4.4). Stateless beyond the cache reference,
/// safe to construct per decision.
pub struct EvalDriver<'a> {
    cache: &'a ExpressionCache,
}

impl<'a> EvalDriver<'a> {
    pub fn new(cache: &'a ExpressionCache) -> Self {
        Self { cache }
    }

    /// Iterate policies in input order; the first whose combined condition
    /// evaluates true wins. A single policy's parse error is skipped
    /// (best-effort); if every policy fails to parse, the last parse error is
    /// returned (spec §4.4).
    pub fn eval_policies(
        &self,
        op: &'static str,
        ctx: &ExprContext,
        policies: &[AuthPolicy],
        without_cache: bool,
    ) -> Result<Decision, PdpError> {
        let mut errors = 0usize;
        let mut last_err = None;

        for policy in policies {
            match self.cache.get_or_parse(op, policy, without_cache) {
                Ok(fragments) => {
                    if let Some(condition) = expression::combine(&fragments, None) {
                        if condition.eval(ctx) {
                            return Ok(Decision::Allow { policy_id: policy.id });
                        }
                    }
                }
                Err(e) => {
                    errors += 1;
                    last_err = Some(e);
                }
            }
        }

        if !policies.is_empty() && errors == policies.len() {
            return Err(last_err.expect("errors counted implies last_err set"));
        }

        Ok(Decision::Deny)
    }

    /// Parse and `PartialEval` every policy against `ctx`; drop policies that
    /// simplify to the constant `false`, keep the rest with their simplified
    /// tree in place of the original (spec §4.4). Preserves input order.
    ///
    /// `resource_types`, when given, additionally restricts each policy's
    /// fragments to those matching before combining (spec §4.5's translator
    /// filtering): the `Eval` path passes `None` (all fragments apply,
    /// since the request's resources were already validated against the
    /// action's resource types), the `Query`/`QueryByExtResources` path
    /// passes the request's query resource types.
    pub fn filter_policies(
        &self,
        op: &'static str,
        ctx: &ExprContext,
        policies: &[AuthPolicy],
        resource_types: Option<&[(String, String)]>,
        without_cache: bool,
    ) -> Result<Vec<(AuthPolicy, Condition)>, PdpError> {
        let mut errors = 0usize;
        let mut last_err = None;
        let mut kept = Vec::new();

        for policy in policies {
            match self.cache.get_or_parse(op, policy, without_cache) {
                Ok(fragments) => {
                    let Some(condition) = expression::combine(&fragments, resource_types) else {
                        continue;
                    };
                    let residual = condition.partial_eval(ctx);
                    if residual.is_false() {
                        continue;
                    }
                    if let Some(simplified) = residual.into_condition() {
                        kept.push((policy.clone(), simplified));
                    }
                }
                Err(e) => {
                    errors += 1;
                    last_err = Some(e);
                }
            }
        }

        if !policies.is_empty() && errors == policies.len() {
            return Err(last_err.expect("errors counted implies last_err set"));
        }

        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ExpressionCache;
    use crate::entities::ResourceRef;
    use crate::value_objects::PolicyId;
    use std::collections::HashMap;
    use std::time::Duration;

    fn policy(id: i64, expr: &str) -> AuthPolicy {
        AuthPolicy {
            id: PolicyId(id),
            version: 1,
            expression: expr.to_string(),
            expression_signature: format!("sig-{id}"),
            expired_at: i64::MAX,
        }
    }

    fn frag(system: &str, r#type: &str, expr: &str) -> String {
        format!(r#"[{{"system":"{system}","type":"{type}","expression":{expr}}}]"#)
    }

    #[test]
    fn first_true_wins() {
        let cache = ExpressionCache::new(Duration::from_secs(60), 100);
        let driver = EvalDriver::new(&cache);

        let policies = vec![
            policy(1, &frag("bk_cmdb", "host", r#"{"op":"StringEquals","field":"bk_cmdb.host.env","value":"stage"}"#)),
            policy(2, &frag("bk_cmdb", "host", r#"{"op":"StringEquals","field":"bk_cmdb.host.env","value":"prod"}"#)),
        ];

        let resource = ResourceRef::new("bk_cmdb", "host", "1").with_attr("env", "prod");
        let (s, a, e) = (HashMap::new(), HashMap::new(), HashMap::new());
        let ctx = ExprContext::new(std::slice::from_ref(&resource), &s, &a, &e);

        let decision = driver.eval_policies("test", &ctx, &policies, false).unwrap();
        assert_eq!(decision, Decision::Allow { policy_id: PolicyId(2) });
    }

    #[test]
    fn deny_when_none_match() {
        let cache = ExpressionCache::new(Duration::from_secs(60), 100);
        let driver = EvalDriver::new(&cache);
        let policies = vec![policy(
            1,
            &frag("bk_cmdb", "host", r#"{"op":"StringEquals","field":"bk_cmdb.host.env","value":"stage"}"#),
        )];
        let resource = ResourceRef::new("bk_cmdb", "host", "1").with_attr("env", "prod");
        let (s, a, e) = (HashMap::new(), HashMap::new(), HashMap::new());
        let ctx = ExprContext::new(std::slice::from_ref(&resource), &s, &a, &e);
        assert_eq!(driver.eval_policies("test", &ctx, &policies, false).unwrap(), Decision::Deny);
    }

    #[test]
    fn single_bad_policy_is_skipped() {
        let cache = ExpressionCache::new(Duration::from_secs(60), 100);
        let driver = EvalDriver::new(&cache);
        let policies = vec![
            policy(1, "{not json"),
            policy(2, &frag("bk_cmdb", "host", r#"{"op":"Any"}"#)),
        ];
        let resource = ResourceRef::new("bk_cmdb", "host", "1");
        let (s, a, e) = (HashMap::new(), HashMap::new(), HashMap::new());
        let ctx = ExprContext::new(std::slice::from_ref(&resource), &s, &a, &e);
        let decision = driver.eval_policies("test", &ctx, &policies, false).unwrap();
        assert_eq!(decision, Decision::Allow { policy_id: PolicyId(2) });
    }

    #[test]
    fn all_policies_erroring_propagates_last_error() {
        let cache = ExpressionCache::new(Duration::from_secs(60), 100);
        let driver = EvalDriver::new(&cache);
        let policies = vec![policy(1, "{not json")];
        let resource = ResourceRef::new("bk_cmdb", "host", "1");
        let (s, a, e) = (HashMap::new(), HashMap::new(), HashMap::new());
        let ctx = ExprContext::new(std::slice::from_ref(&resource), &s, &a, &e);
        assert!(driver.eval_policies("test", &ctx, &policies, false).is_err());
    }

    #[test]
    fn filter_drops_false_and_keeps_residual() {
        let cache = ExpressionCache::new(Duration::from_secs(60), 100);
        let driver = EvalDriver::new(&cache);
        let policies = vec![
            policy(1, &frag("bk_cmdb", "host", r#"{"op":"StringEquals","field":"bk_cmdb.host.env","value":"stage"}"#)),
            policy(
                2,
                &frag(
                    "bk_cmdb",
                    "host",
                    r#"{"op":"AND","content":[
                        {"op":"StringEquals","field":"bk_cmdb.host.env","value":"prod"},
                        {"op":"StringPrefix","field":"bk_cmdb.host.path","value":"/svc/*"}
                    ]}"#,
                ),
            ),
        ];
        let resource = ResourceRef::new("bk_cmdb", "host", "1").with_attr("env", "prod");
        let (s, a, e) = (HashMap::new(), HashMap::new(), HashMap::new());
        let ctx = ExprContext::new(std::slice::from_ref(&resource), &s, &a, &e);

        let kept = driver.filter_policies("test", &ctx, &policies, None, false).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0.id, PolicyId(2));
        assert!(matches!(kept[0].1, Condition::Leaf(_)));
    }
}
