//! Policy Information Point: the port through which the pipeline resolves
//! subject, action, and resource attributes it does not carry itself
//! (spec §3, §4.3, §4.6).

use crate::entities::{ActionDetail, ExtResourceGroup, ExtResourceWithAttribute, SubjectDetail};
use crate::error::PdpError;
use crate::value_objects::{AttrKey, Value};
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves identity and resource attributes on behalf of the evaluation
/// driver. Implementations talk to whatever directory, CMDB, or cache backs
/// the deployment; the pipeline only ever sees this trait.
#[async_trait]
pub trait PipProvider: Send + Sync {
    /// Subject directory lookup: pk, department pks, group memberships
    /// (spec §3).
    async fn get_subject_detail(&self, subject_type: &str, subject_id: &str) -> Result<SubjectDetail, PdpError>;

    /// Action directory lookup: pk and expected resource-type signature
    /// (spec §3).
    async fn get_action_detail(&self, action_id: &str) -> Result<ActionDetail, PdpError>;

    /// Fetch attributes for one resource not already attached to the
    /// request (spec §4.6's remote fill path). `keys` is exactly the set of
    /// attribute leaf-names the applicable policies reference for this
    /// resource's `(system, type)`, already stripped of the
    /// `{system}.{type}.` prefix (spec §4.3), so the PIP only fetches what
    /// evaluation will actually read.
    async fn get_resource_attributes(
        &self,
        system: &str,
        r#type: &str,
        id: &str,
        keys: &[AttrKey],
    ) -> Result<HashMap<AttrKey, Value>, PdpError>;

    /// `BatchQueryRemoteResourcesAttribute` (spec §4.3, §6): fetch
    /// attributes for every id in each group in one round trip per group.
    /// `keys` carries the same prefix-stripped key set as
    /// `get_resource_attributes`, scoped to the `(system, type)` of the
    /// groups passed in one call.
    async fn batch_query_remote_resources_attribute(
        &self,
        groups: &[ExtResourceGroup],
        keys: &[AttrKey],
    ) -> Result<Vec<ExtResourceWithAttribute>, PdpError>;
}
