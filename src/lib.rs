#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod action;
pub mod decision;
pub mod error;
pub mod plan;
pub mod policy;
pub mod session;

pub use action::{Action, Command, RiskLevel, TargetSet};
pub use decision::{Decision, DecisionStatus};
pub use error::{GuardError, Result};
pub use plan::{Check, CheckStatus, CheckType, Plan, StopCondition};
pub use policy::{ExecutionMode, PolicyConfig};
pub use session::{ActionOutcome, ExecuteRequest, SessionStore};
