//! Attribute context (C3): an ordered pair `(Resources, environment)` exposing
//! `get_attribute(full_key)` to the condition algebra (spec §3).

use crate::entities::ResourceRef;
use crate::value_objects::{AttrKey, Value};
use std::collections::HashMap;

/// Per-decision attribute lookup. Lifetime is one decision only (spec §3's
/// "Lifecycles"); nothing here is shared across requests.
///
/// Holds a slice rather than a single resource so multi-resource requests
/// (an action spanning more than one resource type, spec §3's action
/// `resource_types`) resolve each leaf's key against whichever resource
/// carries its `{system}.{type}.` prefix.
#[derive(Debug, Clone)]
pub struct ExprContext<'a> {
    resources: &'a [ResourceRef],
    subject_attrs: &'a HashMap<AttrKey, Value>,
    action_attrs: &'a HashMap<AttrKey, Value>,
    environment: &'a HashMap<AttrKey, Value>,
}

impl<'a> ExprContext<'a> {
    pub fn new(
        resources: &'a [ResourceRef],
        subject_attrs: &'a HashMap<AttrKey, Value>,
        action_attrs: &'a HashMap<AttrKey, Value>,
        environment: &'a HashMap<AttrKey, Value>,
    ) -> Self {
        Self {
            resources,
            subject_attrs,
            action_attrs,
            environment,
        }
    }

    /// Look up a fully-qualified key. Precedence: subject (`iam.subject.*`),
    /// action (`iam.action.*`), resource (`{system}.{type}.*`, local or
    /// remote, already merged into the resource by the time a context is
    /// built), then environment (spec §4.3).
    pub fn get_attribute(&self, full_key: &str) -> Option<&Value> {
        if let Some(key) = full_key.strip_prefix("iam.subject.") {
            return self.subject_attrs.get(key);
        }
        if let Some(key) = full_key.strip_prefix("iam.action.") {
            return self.action_attrs.get(key);
        }

        for resource in self.resources {
            let resource_prefix = format!("{}.{}.", resource.system, resource.r#type);
            if let Some(key) = full_key.strip_prefix(resource_prefix.as_str()) {
                if let Some(v) = resource.attr.get(key) {
                    return Some(v);
                }
            }
        }

        self.environment.get(full_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ResourceRef;

    #[test]
    fn resolves_by_precedence() {
        let resource = ResourceRef::new("bk_cmdb", "host", "1").with_attr("env", "prod");
        let resources = [resource];
        let subject_attrs = HashMap::from([("department".to_string(), Value::from("eng"))]);
        let action_attrs = HashMap::new();
        let environment = HashMap::from([("now".to_string(), Value::Integer(100))]);

        let ctx = ExprContext::new(&resources, &subject_attrs, &action_attrs, &environment);

        assert_eq!(
            ctx.get_attribute("bk_cmdb.host.env"),
            Some(&Value::from("prod"))
        );
        assert_eq!(
            ctx.get_attribute("iam.subject.department"),
            Some(&Value::from("eng"))
        );
        assert_eq!(ctx.get_attribute("now"), Some(&Value::Integer(100)));
        assert_eq!(ctx.get_attribute("bk_cmdb.host.missing"), None);
    }

    #[test]
    fn resolves_across_multiple_resources() {
        let r1 = ResourceRef::new("bk_cmdb", "host", "1").with_attr("env", "prod");
        let r2 = ResourceRef::new("bk_cmdb", "module", "2").with_attr("name", "api");
        let resources = [r1, r2];
        let (s, a, e) = (HashMap::new(), HashMap::new(), HashMap::new());
        let ctx = ExprContext::new(&resources, &s, &a, &e);

        assert_eq!(ctx.get_attribute("bk_cmdb.host.env"), Some(&Value::from("prod")));
        assert_eq!(ctx.get_attribute("bk_cmdb.module.name"), Some(&Value::from("api")));
    }
}
