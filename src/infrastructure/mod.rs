//! Infrastructure layer: in-memory PIP/PAP fixtures for the `pdp-eval`
//! harness and tests. The real network/DB-backed adapters are an explicit
//! non-goal of this crate (spec §1); callers implement `PipProvider`/
//! `PapProvider` themselves for a live deployment.

pub mod fixture;

pub use fixture::{Fixture, FixturePap, FixturePip};
