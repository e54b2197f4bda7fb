//! In-memory PIP/PAP fixtures (spec §6's external interfaces, reduced to a
//! single JSON bundle) used by the `pdp-eval` CLI harness and integration
//! tests, so policy expressions can be smoke-tested without a live PAP/PIP
//! deployment.

use crate::entities::{ActionDetail, AuthPolicy, ExtResourceGroup, ExtResourceWithAttribute, SubjectDetail};
use crate::error::PdpError;
use crate::ports::{PapProvider, PipProvider};
use crate::value_objects::{AttrKey, Pk, Value};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// One subject's directory entry, keyed by `(subject_type, subject_id)`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectFixture {
    pub r#type: String,
    pub id: String,
    pub detail: SubjectDetail,
}

/// One action's directory entry, keyed by `action_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionFixture {
    pub id: String,
    pub detail: ActionDetail,
}

/// One resource's attribute set, as a PIP would return it for
/// `QueryRemoteResourceAttribute`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceAttrFixture {
    pub system: String,
    pub r#type: String,
    pub id: String,
    pub attr: HashMap<AttrKey, Value>,
}

/// One stored policy, with the subject/action PKs it is attached to, the
/// shape `ListBySubjectAction` would otherwise resolve via a join (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFixture {
    pub subject_pks: Vec<Pk>,
    pub action_pk: Pk,
    pub policy: AuthPolicy,
}

/// The full in-memory dataset for one `pdp-eval` run: enough to back both
/// `FixturePip` and `FixturePap` without any network or database.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Fixture {
    #[serde(default)]
    pub subjects: Vec<SubjectFixture>,
    #[serde(default)]
    pub actions: Vec<ActionFixture>,
    #[serde(default)]
    pub resource_attrs: Vec<ResourceAttrFixture>,
    #[serde(default)]
    pub policies: Vec<PolicyFixture>,
}

/// In-memory `PipProvider` backed by a `Fixture`.
pub struct FixturePip {
    subjects: HashMap<(String, String), SubjectDetail>,
    actions: HashMap<String, ActionDetail>,
    resource_attrs: HashMap<(String, String, String), HashMap<AttrKey, Value>>,
}

impl From<&Fixture> for FixturePip {
    fn from(fixture: &Fixture) -> Self {
        let subjects = fixture
            .subjects
            .iter()
            .map(|s| ((s.r#type.clone(), s.id.clone()), s.detail.clone()))
            .collect();
        let actions = fixture
            .actions
            .iter()
            .map(|a| (a.id.clone(), a.detail.clone()))
            .collect();
        let resource_attrs = fixture
            .resource_attrs
            .iter()
            .map(|r| ((r.system.clone(), r.r#type.clone(), r.id.clone()), r.attr.clone()))
            .collect();
        Self {
            subjects,
            actions,
            resource_attrs,
        }
    }
}

#[async_trait]
impl PipProvider for FixturePip {
    async fn get_subject_detail(&self, subject_type: &str, subject_id: &str) -> Result<SubjectDetail, PdpError> {
        self.subjects
            .get(&(subject_type.to_string(), subject_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                PdpError::upstream(
                    "FixturePip::get_subject_detail",
                    format!("no fixture subject {subject_type}/{subject_id}"),
                )
            })
    }

    async fn get_action_detail(&self, action_id: &str) -> Result<ActionDetail, PdpError> {
        self.actions.get(action_id).cloned().ok_or_else(|| {
            PdpError::upstream("FixturePip::get_action_detail", format!("no fixture action {action_id}"))
        })
    }

    async fn get_resource_attributes(
        &self,
        system: &str,
        r#type: &str,
        id: &str,
        keys: &[AttrKey],
    ) -> Result<HashMap<AttrKey, Value>, PdpError> {
        let attr = self
            .resource_attrs
            .get(&(system.to_string(), r#type.to_string(), id.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(filter_to_keys(attr, keys))
    }

    async fn batch_query_remote_resources_attribute(
        &self,
        groups: &[ExtResourceGroup],
        keys: &[AttrKey],
    ) -> Result<Vec<ExtResourceWithAttribute>, PdpError> {
        let mut out = Vec::new();
        for group in groups {
            for id in &group.ids {
                let attr = self
                    .resource_attrs
                    .get(&(group.system.clone(), group.r#type.clone(), id.clone()))
                    .cloned()
                    .unwrap_or_default();
                out.push(ExtResourceWithAttribute {
                    system: group.system.clone(),
                    r#type: group.r#type.clone(),
                    id: id.clone(),
                    attr: filter_to_keys(attr, keys),
                });
            }
        }
        Ok(out)
    }
}

/// Restrict a fetched attribute map to the requested `keys`, the way a real
/// PIP only returns what it was asked for (spec §4.3).
fn filter_to_keys(attr: HashMap<AttrKey, Value>, keys: &[AttrKey]) -> HashMap<AttrKey, Value> {
    if keys.is_empty() {
        return attr;
    }
    attr.into_iter().filter(|(k, _)| keys.contains(k)).collect()
}

/// In-memory `PapProvider` backed by a `Fixture`.
pub struct FixturePap {
    policies: Vec<PolicyFixture>,
}

impl From<&Fixture> for FixturePap {
    fn from(fixture: &Fixture) -> Self {
        Self {
            policies: fixture.policies.clone(),
        }
    }
}

#[async_trait]
impl PapProvider for FixturePap {
    async fn get_policies(&self, subject_pks: &[Pk], action_pk: Pk) -> Result<Vec<AuthPolicy>, PdpError> {
        Ok(self
            .policies
            .iter()
            .filter(|p| p.action_pk == action_pk && p.subject_pks.iter().any(|pk| subject_pks.contains(pk)))
            .map(|p| p.policy.clone())
            .collect())
    }
}
