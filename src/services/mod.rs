//! Evaluation pipeline services, each corresponding to one spec component.

mod attribute_fill;
mod driver;
mod translator;

pub use attribute_fill::AttributeFiller;
pub use driver::{Decision, EvalDriver};
pub use translator::translate_policies;
