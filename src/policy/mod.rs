mod budget;
mod classify;
mod config;

pub use budget::annotate_plan;
pub use classify::{Classification, classify};
pub use config::PolicyConfig;

use serde::{Deserialize, Serialize};

/// How much latitude the caller has granted for this plan.
///
/// `Autonomous` lets low-risk actions run without confirmation; `Interactive`
/// withholds approval from everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Interactive,
    Autonomous,
}

#[cfg(test)]
mod tests;
