//! Layered error type for the PDP pipeline.
//!
//! Every public operation wraps its failure with the name of the layer it
//! happened in, following the `"PDP: <op>: <inner>"` convention from the
//! original implementation's `errorx.NewLayerFunctionErrorWrapf`.

use thiserror::Error;

/// Errors produced anywhere in the PDP pipeline.
#[derive(Debug, Error)]
pub enum PdpError {
    /// The request's resources don't match the action's resource types, or a
    /// required field is missing.
    #[error("PDP: {op}: invalid request: {reason}")]
    InvalidRequest { op: &'static str, reason: String },

    /// No policies were found for (subject, action). Distinct from a normal
    /// deny so callers can tell "no policy" from "denied by policy".
    #[error("PDP: {op}: no policies found for subject/action")]
    NoPolicies { op: &'static str },

    /// A PIP, PAP, or other upstream dependency failed or timed out. Never a
    /// deny; surfaced to the caller as retryable.
    #[error("PDP: {op}: upstream unavailable: {reason}")]
    UpstreamUnavailable { op: &'static str, reason: String },

    /// A single policy's expression failed to parse. Carries the offending
    /// policy id; the driver absorbs this unless every policy fails.
    #[error("PDP: {op}: expression parse error for policy {policy_id}: {reason}")]
    ExpressionParseError {
        op: &'static str,
        policy_id: String,
        reason: String,
    },

    /// An invariant was violated (empty AND/OR children, malformed cache
    /// entry, etc).
    #[error("PDP: {op}: internal error: {reason}")]
    InternalError { op: &'static str, reason: String },
}

impl PdpError {
    pub fn invalid_request(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            op,
            reason: reason.into(),
        }
    }

    pub fn no_policies(op: &'static str) -> Self {
        Self::NoPolicies { op }
    }

    pub fn upstream(op: &'static str, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            op,
            reason: reason.into(),
        }
    }

    pub fn parse_error(op: &'static str, policy_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExpressionParseError {
            op,
            policy_id: policy_id.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InternalError {
            op,
            reason: reason.into(),
        }
    }

    /// Maps to the CLI test-harness exit code table in spec §6.
    pub fn exit_code(&self) -> i32 {
        match self {
            PdpError::InvalidRequest { .. } => 1,
            PdpError::NoPolicies { .. } => 0, // a distinguished deny, not a failure
            PdpError::UpstreamUnavailable { .. } => 2,
            PdpError::ExpressionParseError { .. } => 3,
            PdpError::InternalError { .. } => 3,
        }
    }
}

pub type PdpResult<T> = Result<T, PdpError>;
