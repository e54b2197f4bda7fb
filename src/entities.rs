//! Request-side entities for the policy decision point (spec §3).

use crate::value_objects::{AttrKey, Pk, PolicyId, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An access request: subject, action, resources, environment.
///
/// Invariant: every resource carries `system`, `type`, `id`; `attr` is
/// populated lazily and cached per request (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub system: String,
    pub subject: Subject,
    pub action: Action,
    pub resources: Vec<ResourceRef>,
    pub environment: HashMap<AttrKey, Value>,
    /// Deadline for this decision's upstream calls, in milliseconds. Falls
    /// back to `PdpConfig::default_deadline` when absent (spec §5's
    /// "a request carries a deadline").
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl Request {
    /// The ordered `(system, type)` list of this request's resources, used to
    /// match against an action's expected resource-type signature.
    pub fn resource_types(&self) -> Vec<(String, String)> {
        self.resources
            .iter()
            .map(|r| (r.system.clone(), r.r#type.clone()))
            .collect()
    }

    /// True when the request carries exactly one resource whose attributes
    /// are already fully populated for every key the caller expects to read,
    /// the fast path that lets `Entrance::eval` skip the PIP round trip for
    /// remote resources (spec §4.6).
    pub fn has_single_fully_attributed_local_resource(&self, required_keys: &[AttrKey]) -> bool {
        let [resource] = self.resources.as_slice() else {
            return false;
        };
        required_keys.iter().all(|k| {
            let local_key = k
                .strip_prefix(&format!("{}.{}.", resource.system, resource.r#type))
                .unwrap_or(k.as_str());
            resource.attr.contains_key(local_key)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub r#type: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
}

/// A resource reference carried on a request. `attr` starts possibly-empty
/// and is filled at most once per request by the attribute-fill stage (C5).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResourceRef {
    pub system: String,
    pub r#type: String,
    pub id: String,
    #[serde(default)]
    pub attr: HashMap<String, Value>,
    /// Set once `attr` has been populated by a remote fetch, so the
    /// attribute-fill stage never re-fetches the same resource within a
    /// request (spec §4.3's "at most one fetch" guarantee).
    #[serde(skip)]
    pub remote_attr_filled: bool,
}

impl ResourceRef {
    pub fn new(system: impl Into<String>, r#type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            r#type: r#type.into(),
            id: id.into(),
            attr: HashMap::new(),
            remote_attr_filled: false,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attr.insert(key.into(), value.into());
        self
    }

    /// Merge freshly fetched remote attributes; fails fast (debug-only) if
    /// called twice for the same resource within a request.
    pub fn fill_remote_attrs(&mut self, fetched: HashMap<String, Value>) {
        debug_assert!(
            !self.remote_attr_filled,
            "resource {}.{}.{} attributes fetched more than once in a single request",
            self.system, self.r#type, self.id
        );
        self.attr.extend(fetched);
        self.remote_attr_filled = true;
    }
}

/// A group of external resources sharing `(system, type)`, queried in a batch
/// via `BatchQueryRemoteResourcesAttribute` (spec §4.3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtResourceGroup {
    pub system: String,
    pub r#type: String,
    pub ids: Vec<String>,
}

/// One external resource's id paired with the attributes fetched for it,
/// returned by `Entrance::query_by_ext_resources` alongside the translated
/// residual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtResourceWithAttribute {
    pub system: String,
    pub r#type: String,
    pub id: String,
    pub attr: HashMap<String, Value>,
}

/// Group membership with expiry, as delivered by the subject directory
/// (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_pk: Pk,
    pub policy_expired_at: i64,
}

/// `{pk, department_pks, groups}` from the subject directory (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectDetail {
    pub pk: Pk,
    pub department_pks: Vec<Pk>,
    pub groups: Vec<GroupMembership>,
}

impl SubjectDetail {
    /// Effective subject PKs = {subject.pk} ∪ departments ∪ {g.pk |
    /// g.policy_expired_at > now} (spec §3).
    pub fn effective_pks(&self, now: i64) -> Vec<Pk> {
        let mut pks = Vec::with_capacity(1 + self.department_pks.len() + self.groups.len());
        pks.push(self.pk);
        pks.extend(self.department_pks.iter().copied());
        pks.extend(
            self.groups
                .iter()
                .filter(|g| g.policy_expired_at > now)
                .map(|g| g.group_pk),
        );
        pks
    }
}

/// `{pk, resource_types}` from the action directory (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDetail {
    pub pk: Pk,
    pub resource_types: Vec<(String, String)>,
}

impl ActionDetail {
    /// A request matches this action iff its resources' `(system, type)`
    /// ordered list equals the action's resource-types list (spec §3).
    pub fn matches(&self, request_resource_types: &[(String, String)]) -> bool {
        self.resource_types == request_resource_types
    }
}

/// A stored policy as loaded from the PAP (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPolicy {
    pub id: PolicyId,
    pub version: u32,
    pub expression: String,
    pub expression_signature: String,
    pub expired_at: i64,
}

impl AuthPolicy {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expired_at <= now
    }
}

/// Timestamp helper kept distinct from `chrono::Utc::now()` so callers (and
/// tests) can inject a fixed clock; mirrors the teacher's use of
/// `DateTime<Utc>` for effective-dating checks in `aggregate::Policy`.
pub fn now_unix(now: DateTime<Utc>) -> i64 {
    now.timestamp()
}
