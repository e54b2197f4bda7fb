//! Ports: async traits the evaluation pipeline calls out through for
//! attribute and policy data it doesn't own (spec §3's PIP/PAP).

pub mod pap;
pub mod pip;

pub use pap::PapProvider;
pub use pip::PipProvider;
