//! Attribute fill / PIP adapter (C5): batches lookups of subject, action,
//! and resource attributes and memoizes them per request (spec §4.3).

use crate::entities::{ActionDetail, ResourceRef, SubjectDetail};
use crate::error::PdpError;
use crate::ports::PipProvider;
use crate::value_objects::{AttrKey, Value};
use std::collections::HashMap;

/// Stateless adapter over a `PipProvider`. Per-request memoization lives on
/// `ResourceRef` itself (`remote_attr_filled`), so this type carries no
/// state of its own, so it is safe to construct fresh per decision.
pub struct AttributeFiller;

impl AttributeFiller {
    /// Project a subject detail into the `iam.subject.*` attribute space
    /// (spec §4.3). `SubjectDetail`'s fixed schema (`pk`, `department_pks`,
    /// `groups`) only yields `pk` and `department_pks` as leaf-comparable
    /// values; group membership is consumed directly as effective PKs
    /// (`SubjectDetail::effective_pks`) rather than exposed as an attribute.
    pub fn subject_attrs(detail: &SubjectDetail) -> HashMap<AttrKey, Value> {
        HashMap::from([
            ("pk".to_string(), Value::Integer(detail.pk)),
            (
                "department_pks".to_string(),
                Value::List(detail.department_pks.iter().map(|pk| Value::Integer(*pk)).collect()),
            ),
        ])
    }

    /// Project an action detail into the `iam.action.*` attribute space.
    pub fn action_attrs(detail: &ActionDetail) -> HashMap<AttrKey, Value> {
        HashMap::from([("pk".to_string(), Value::Integer(detail.pk))])
    }

    /// The attribute leaf-names the applicable policies reference for this
    /// resource's `(system, type)`, stripped of the `{system}.{type}.`
    /// prefix: exactly the `keys` argument spec §4.3 passes to
    /// `QueryRemoteResourceAttribute` (mirrors `getConditionAttrKeys` in the
    /// original implementation).
    fn scoped_keys(resource: &ResourceRef, required_keys: &[AttrKey]) -> Vec<AttrKey> {
        let prefix = format!("{}.{}.", resource.system, resource.r#type);
        required_keys
            .iter()
            .filter_map(|k| k.strip_prefix(prefix.as_str()))
            .map(str::to_string)
            .collect()
    }

    /// Fetch and merge this resource's remote attributes if any of
    /// `required_keys` that belong to it (by `{system}.{type}.` prefix) are
    /// not already present locally, at most once per resource per request
    /// (spec §4.3).
    pub async fn fill_resource_if_needed(
        pip: &dyn PipProvider,
        resource: &mut ResourceRef,
        required_keys: &[AttrKey],
    ) -> Result<(), PdpError> {
        if resource.remote_attr_filled {
            return Ok(());
        }

        let keys = Self::scoped_keys(resource, required_keys);
        let needs_fetch = keys.iter().any(|local| !resource.attr.contains_key(local));
        if !needs_fetch {
            return Ok(());
        }

        let fetched = pip
            .get_resource_attributes(&resource.system, &resource.r#type, &resource.id, &keys)
            .await?;
        resource.fill_remote_attrs(fetched);
        Ok(())
    }

    /// Fill every resource on a request that needs it for `required_keys`.
    pub async fn fill_all(
        pip: &dyn PipProvider,
        resources: &mut [ResourceRef],
        required_keys: &[AttrKey],
    ) -> Result<(), PdpError> {
        for resource in resources.iter_mut() {
            Self::fill_resource_if_needed(pip, resource, required_keys).await?;
        }
        Ok(())
    }
}
