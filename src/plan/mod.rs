use crate::action::{Action, RiskLevel};
use serde::{Deserialize, Serialize};

/// A validated execution plan handed in by the plan-generation collaborator.
///
/// Goal and subgoals are advisory metadata: carried through to callers,
/// never interpreted here. Identifier uniqueness and subgoal dependency
/// integrity are the schema validator's responsibility; the core tolerates
/// whatever it receives and does not re-validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub summary: String,
    #[serde(default)]
    pub steps: Vec<String>,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub subgoals: Vec<Subgoal>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub stop_conditions: Vec<StopCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgoal {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A declared verification that is recomputed fresh on every decision.
///
/// `status` is a projection of current action states, never a persisted log;
/// two evaluations with no intervening mutation produce identical statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub check_type: CheckType,
    #[serde(default)]
    pub status: CheckStatus,
    #[serde(default)]
    pub on_fail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Constraint,
    Success,
    Safety,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    #[default]
    Pending,
    Passed,
    Failed,
    Unknown,
}

/// Declarative end-of-loop rules, resolved in declaration order.
///
/// The first condition that matches wins; later conditions are not consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopCondition {
    AllChecksPassed,
    MaxIterations { value: u32 },
    NoProgress { iterations: u32 },
    RiskThreshold { max_risk: RiskLevel },
    UserDenied,
    ManualStop,
}
