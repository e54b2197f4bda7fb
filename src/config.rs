//! Runtime configuration for the PDP pipeline.
//!
//! Mirrors the environment-variable-with-fallback style the teacher's
//! `policy-service` binary uses for `NATS_URL`/`LOG_LEVEL`/`SNAPSHOT_FREQUENCY`.

use std::env;
use std::time::Duration;

/// Tunables for the expression cache and the per-request deadline.
#[derive(Debug, Clone)]
pub struct PdpConfig {
    /// How long a parsed expression stays valid in the cache (spec §4.2: default 5m).
    pub parse_cache_ttl: Duration,
    /// Size bound for the parse cache (spec §4.2: default 10^4 entries).
    pub parse_cache_capacity: usize,
    /// Default deadline for a single decision's upstream calls (spec §5).
    pub default_deadline: Duration,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            parse_cache_ttl: Duration::from_secs(5 * 60),
            parse_cache_capacity: 10_000,
            default_deadline: Duration::from_secs(2),
        }
    }
}

impl PdpConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let parse_cache_ttl = env::var("PDP_PARSE_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.parse_cache_ttl);

        let parse_cache_capacity = env::var("PDP_PARSE_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.parse_cache_capacity);

        let default_deadline = env::var("PDP_DEFAULT_DEADLINE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.default_deadline);

        Self {
            parse_cache_ttl,
            parse_cache_capacity,
            default_deadline,
        }
    }
}
