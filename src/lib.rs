//! # pdp-core
//!
//! The Policy Decision Point (PDP) of an attribute-based access-control
//! (ABAC) permission center: given an access request (subject, action,
//! resources, environment), decides whether the subject may perform the
//! action, or returns a residual expression describing the conditions under
//! which access would be allowed.
//!
//! ## Pipeline
//!
//! - [`condition`]: the condition algebra (C1), a recursive tree of leaf
//!   operators and `AND`/`OR`/`NOT` combinators, supporting `eval`,
//!   `get_keys`, `partial_eval`, `translate`.
//! - [`expression`] and [`cache`]: the expression parser and parse cache
//!   (C2).
//! - [`context`]: the attribute context (C3).
//! - [`services::EvalDriver`]: the evaluation driver (C4).
//! - [`services::AttributeFiller`] and [`ports::pip`]: the attribute-fill
//!   / PIP adapter (C5).
//! - [`services::translate_policies`]: the translator (C6).
//! - [`entrance::Entrance`]: the public facade (C7) wiring C1–C6.
//!
//! ## Usage
//!
//! ```no_run
//! use pdp_core::config::PdpConfig;
//! use pdp_core::entrance::Entrance;
//! use pdp_core::infrastructure::{Fixture, FixturePap, FixturePip};
//! use pdp_core::entities::Request;
//!
//! # async fn run(request: &mut Request, fixture: &Fixture) -> Result<(), pdp_core::error::PdpError> {
//! let entrance = Entrance::new(
//!     FixturePip::from(fixture),
//!     FixturePap::from(fixture),
//!     PdpConfig::from_env(),
//! );
//! let allowed = entrance.eval(request, false).await?;
//! # let _ = allowed;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod condition;
pub mod config;
pub mod context;
pub mod entities;
pub mod entrance;
pub mod error;
pub mod expression;
pub mod infrastructure;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use condition::{Condition, Leaf, Residual};
pub use config::PdpConfig;
pub use entrance::Entrance;
pub use error::{PdpError, PdpResult};
