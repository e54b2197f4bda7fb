//! Entrance (C7): the public `Eval`/`Query`/`QueryByExtResources` facade that
//! wires C1–C6 into the three decision operations the PDP exposes (spec
//! §4.6).

use crate::cache::ExpressionCache;
use crate::condition::Condition;
use crate::config::PdpConfig;
use crate::context::ExprContext;
use crate::entities::{now_unix, AuthPolicy, ExtResourceGroup, ExtResourceWithAttribute, Request};
use crate::error::PdpError;
use crate::ports::{PapProvider, PipProvider};
use crate::services::{translate_policies, AttributeFiller, Decision, EvalDriver};
use crate::value_objects::{new_request_id, AttrKey};
use std::future::Future;
use std::time::Duration;
use tracing::instrument;

/// Wires a `PipProvider` and a `PapProvider` behind the three decision
/// operations. Generic so callers can substitute network-backed adapters or
/// the in-memory fixtures this crate ships for tests and the CLI harness
/// (spec §4.6).
pub struct Entrance<P, A> {
    pip: P,
    pap: A,
    cache: ExpressionCache,
    config: PdpConfig,
}

impl<P, A> Entrance<P, A>
where
    P: PipProvider,
    A: PapProvider,
{
    pub fn new(pip: P, pap: A, config: PdpConfig) -> Self {
        let cache = ExpressionCache::new(config.parse_cache_ttl, config.parse_cache_capacity);
        Self { pip, pap, cache, config }
    }

    fn deadline(&self, request: &Request) -> Duration {
        request
            .deadline_ms
            .map(Duration::from_millis)
            .unwrap_or(self.config.default_deadline)
    }

    /// Wrap a PIP/PAP call with the request's deadline (spec §5's
    /// cancellation paragraph): a timeout surfaces as `UpstreamUnavailable`,
    /// never as a deny.
    async fn with_deadline<T>(
        &self,
        op: &'static str,
        request: &Request,
        fut: impl Future<Output = Result<T, PdpError>>,
    ) -> Result<T, PdpError> {
        tokio::time::timeout(self.deadline(request), fut)
            .await
            .map_err(|_| PdpError::upstream(op, "deadline exceeded"))?
    }

    /// Resolve the action, the subject, and the applicable (non-expired)
    /// policy set: the prefix shared by all three public operations (spec
    /// §4.6's `Received → ActionFilled → SubjectFilled → PoliciesLoaded`
    /// transitions).
    async fn resolve_policies(
        &self,
        op: &'static str,
        request: &Request,
    ) -> Result<
        (
            std::collections::HashMap<AttrKey, crate::value_objects::Value>,
            std::collections::HashMap<AttrKey, crate::value_objects::Value>,
            Vec<AuthPolicy>,
        ),
        PdpError,
    > {
        let request_id = new_request_id();
        tracing::info!(stage = "received", %request_id, system = %request.system, action = %request.action.id);

        let action_detail = self
            .with_deadline(op, request, self.pip.get_action_detail(&request.action.id))
            .await?;
        tracing::info!(stage = "action_filled");

        if !action_detail.matches(&request.resource_types()) {
            return Err(PdpError::invalid_request(
                op,
                "request resources do not match the action's resource types",
            ));
        }

        let subject_detail = self
            .with_deadline(
                op,
                request,
                self.pip.get_subject_detail(&request.subject.r#type, &request.subject.id),
            )
            .await?;
        tracing::info!(stage = "subject_filled");

        let now = now_unix(chrono::Utc::now());
        let effective_pks = subject_detail.effective_pks(now);
        let mut policies = self
            .with_deadline(op, request, self.pap.get_policies(&effective_pks, action_detail.pk))
            .await?;
        policies.retain(|p| !p.is_expired(now));

        if policies.is_empty() {
            return Err(PdpError::no_policies(op));
        }
        tracing::info!(stage = "policies_loaded", count = policies.len());

        let subject_attrs = AttributeFiller::subject_attrs(&subject_detail);
        let action_attrs = AttributeFiller::action_attrs(&action_detail);

        Ok((subject_attrs, action_attrs, policies))
    }

    /// Every key referenced by any of `policies`' conditions, across all
    /// resource-type fragments, used to drive attribute fill (spec §4.3).
    fn required_keys(
        &self,
        op: &'static str,
        policies: &[AuthPolicy],
        without_cache: bool,
    ) -> Result<Vec<AttrKey>, PdpError> {
        let mut keys = Vec::new();
        for policy in policies {
            if let Ok(fragments) = self.cache.get_or_parse(op, policy, without_cache) {
                for fragment in fragments.iter() {
                    keys.extend(fragment.condition.get_keys());
                }
            }
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// `Eval(request, without_cache) → bool` (spec §4.6).
    #[instrument(skip_all)]
    pub async fn eval(&self, request: &mut Request, without_cache: bool) -> Result<bool, PdpError> {
        const OP: &str = "Entrance::eval";

        let (subject_attrs, action_attrs, policies) = self.resolve_policies(OP, request).await?;
        let required_keys = self.required_keys(OP, &policies, without_cache)?;

        let driver = EvalDriver::new(&self.cache);

        let allow = if request.has_single_fully_attributed_local_resource(&required_keys) {
            let ctx = ExprContext::new(&request.resources, &subject_attrs, &action_attrs, &request.environment);
            matches!(
                driver.eval_policies(OP, &ctx, &policies, without_cache)?,
                Decision::Allow { .. }
            )
        } else {
            // filterPoliciesByEvalResources (spec §4.6): fill remote resource
            // attributes, then FilterPolicies, and pass iff any policy
            // survives. A leaf whose key stays unresolved after fill must
            // survive as a residual, not evaluate false.
            self.with_deadline(
                OP,
                request,
                AttributeFiller::fill_all(&self.pip, &mut request.resources, &required_keys),
            )
            .await?;
            tracing::info!(stage = "attributes_filled");
            let ctx = ExprContext::new(&request.resources, &subject_attrs, &action_attrs, &request.environment);
            let survivors = driver.filter_policies(OP, &ctx, &policies, None, without_cache)?;
            !survivors.is_empty()
        };

        tracing::info!(stage = "decided", allow);
        Ok(allow)
    }

    /// `Query(request, will_check_remote_resource, without_cache) → JSON`
    /// (spec §4.6). When `will_check_remote_resource` is set, remote
    /// resource attributes are fetched before filtering; otherwise the
    /// filter runs against whatever attributes the request already carries,
    /// leaving the rest to the residual.
    #[instrument(skip_all)]
    pub async fn query(
        &self,
        request: &mut Request,
        will_check_remote_resource: bool,
        without_cache: bool,
    ) -> Result<serde_json::Value, PdpError> {
        const OP: &str = "Entrance::query";

        let (subject_attrs, action_attrs, policies) = self.resolve_policies(OP, request).await?;

        if will_check_remote_resource {
            let required_keys = self.required_keys(OP, &policies, without_cache)?;
            self.with_deadline(
                OP,
                request,
                AttributeFiller::fill_all(&self.pip, &mut request.resources, &required_keys),
            )
            .await?;
            tracing::info!(stage = "attributes_filled");
        }

        let resource_types = request.resource_types();
        let ctx = ExprContext::new(&request.resources, &subject_attrs, &action_attrs, &request.environment);
        let driver = EvalDriver::new(&self.cache);
        let survivors: Vec<(AuthPolicy, Condition)> =
            driver.filter_policies(OP, &ctx, &policies, Some(&resource_types), without_cache)?;

        tracing::info!(stage = "decided", surviving = survivors.len());
        translate_policies(&survivors)
    }

    /// `QueryByExtResources(request, ext_resources, without_cache) → (JSON,
    /// [ExtResourceWithAttribute])` (spec §4.6): like `Query`, but also
    /// batch-fetches attributes for each external resource group using the
    /// surviving policies' required keys.
    #[instrument(skip_all)]
    pub async fn query_by_ext_resources(
        &self,
        request: &mut Request,
        ext_resources: &[ExtResourceGroup],
        without_cache: bool,
    ) -> Result<(serde_json::Value, Vec<ExtResourceWithAttribute>), PdpError> {
        const OP: &str = "Entrance::query_by_ext_resources";

        let (subject_attrs, action_attrs, policies) = self.resolve_policies(OP, request).await?;

        let resource_types = request.resource_types();
        let ctx = ExprContext::new(&request.resources, &subject_attrs, &action_attrs, &request.environment);
        let driver = EvalDriver::new(&self.cache);
        let survivors: Vec<(AuthPolicy, Condition)> =
            driver.filter_policies(OP, &ctx, &policies, Some(&resource_types), without_cache)?;

        // Exactly the keys the surviving conditions reference, stripped of
        // each group's `{system}.{type}.` prefix (spec §4.3's
        // `getConditionAttrKeys` equivalent), so each batch fetch only asks
        // the PIP for what evaluation will actually read.
        let mut survivor_keys: Vec<AttrKey> = survivors.iter().flat_map(|(_, c)| c.get_keys()).collect();
        survivor_keys.sort();
        survivor_keys.dedup();

        let mut ext_attrs = Vec::new();
        for group in ext_resources {
            let prefix = format!("{}.{}.", group.system, group.r#type);
            let scoped_keys: Vec<AttrKey> = survivor_keys
                .iter()
                .filter_map(|k| k.strip_prefix(prefix.as_str()))
                .map(str::to_string)
                .collect();
            let mut group_attrs = self
                .with_deadline(
                    OP,
                    request,
                    self.pip
                        .batch_query_remote_resources_attribute(std::slice::from_ref(group), &scoped_keys),
                )
                .await?;
            ext_attrs.append(&mut group_attrs);
        }

        tracing::info!(stage = "decided", surviving = survivors.len());
        let translated = translate_policies(&survivors)?;
        Ok((translated, ext_attrs))
    }
}
