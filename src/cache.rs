//! Parsed-expression cache (C2): avoids re-parsing a policy's expression
//! JSON on every decision (spec §4.2).
//!
//! Keyed by `expression_signature` (a content hash the PAP computes and
//! stores alongside the policy) rather than the policy id, so two policies
//! sharing an identical expression share one cache entry, and a policy whose
//! expression changed invalidates itself automatically: the PAP is
//! responsible for recomputing the signature whenever `expression` changes.

use crate::entities::AuthPolicy;
use crate::error::PdpError;
use crate::expression::PolicyExpression;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Entry {
    fragments: Arc<PolicyExpression>,
    inserted_at: Instant,
}

/// Sharded-lock cache mapping expression signature to a policy's parsed
/// fragments, bounded by both TTL and entry count (spec §4.2).
pub struct ExpressionCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    capacity: usize,
}

impl ExpressionCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Return the cached parse for `policy.expression_signature` if present
    /// and unexpired; otherwise parse, insert, and return it. Pass
    /// `without_cache = true` to bypass the cache entirely (spec §4.6's
    /// `Eval`/`Query` `withoutCache` flag), still parsing but never reading
    /// or writing the shared map.
    pub fn get_or_parse(
        &self,
        op: &'static str,
        policy: &AuthPolicy,
        without_cache: bool,
    ) -> Result<Arc<PolicyExpression>, PdpError> {
        if !without_cache {
            if let Some(entry) = self.entries.get(&policy.expression_signature) {
                if entry.inserted_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&entry.fragments));
                }
            }
        }

        let parsed = crate::expression::parse(op, policy.id.0, &policy.expression)?;
        let fragments = Arc::new(parsed);

        if !without_cache {
            if self.entries.len() >= self.capacity {
                self.evict_one_expired_or_any();
            }
            self.entries.insert(
                policy.expression_signature.clone(),
                Entry {
                    fragments: Arc::clone(&fragments),
                    inserted_at: Instant::now(),
                },
            );
        }

        Ok(fragments)
    }

    /// Best-effort eviction when the cache is at capacity: drop any expired
    /// entry if one exists, otherwise drop an arbitrary entry rather than let
    /// the cache grow unbounded (spec §4.2's size bound).
    fn evict_one_expired_or_any(&self) {
        let expired_key = self
            .entries
            .iter()
            .find(|e| e.inserted_at.elapsed() >= self.ttl)
            .map(|e| e.key().clone());

        let key = expired_key.or_else(|| self.entries.iter().next().map(|e| e.key().clone()));
        if let Some(key) = key {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
