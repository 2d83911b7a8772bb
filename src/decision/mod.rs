use crate::action::{Action, RiskLevel};
use crate::plan::{Check, CheckStatus, CheckType, StopCondition};
use crate::session::{ActionState, REJECTION_MESSAGE, Session, SessionAction};
use serde::Serialize;

/// The single outward-facing answer to "what happens next".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    ReadyToExecute,
    AwaitingApproval,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub succeeded: usize,
    pub total: usize,
}

/// Detail of the action a caller should act on next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextAction {
    pub index: usize,
    pub action: Action,
    pub state: ActionState,
    pub attempts: u32,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub session_id: String,
    pub status: DecisionStatus,
    pub summary: String,
    pub steps: Vec<String>,
    pub checks: Vec<Check>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_condition: Option<StopCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
}

/// Project current session state into a decision.
///
/// Pure and idempotent: two calls with no intervening mutation produce
/// identical output. Checks are recomputed fresh; stop conditions resolve in
/// declaration order, first match wins.
pub fn evaluate(session: &Session) -> Decision {
    let checks = evaluate_checks(session);
    let progress = Progress {
        succeeded: count_in_state(session, ActionState::Succeeded),
        total: session.actions.len(),
    };

    let decision = if let Some(condition) = resolve_stop_condition(session, &checks) {
        decision_for_stop(session, condition, checks, progress)
    } else {
        decision_for_progress(session, checks, progress)
    };

    tracing::debug!(
        session = %decision.session_id,
        status = ?decision.status,
        "decision evaluated"
    );
    decision
}

fn count_in_state(session: &Session, state: ActionState) -> usize {
    session
        .actions
        .iter()
        .filter(|action| action.state == state)
        .count()
}

fn evaluate_checks(session: &Session) -> Vec<Check> {
    let any_failed = session
        .actions
        .iter()
        .any(|action| action.state == ActionState::Failed);
    let any_pending = session
        .actions
        .iter()
        .any(|action| action.state == ActionState::Pending);
    let high_failed = session.actions.iter().any(|action| {
        action.action.risk == RiskLevel::High && action.state == ActionState::Failed
    });
    let high_unapproved_pending = session.actions.iter().any(|action| {
        action.action.risk == RiskLevel::High
            && action.state == ActionState::Pending
            && !action.approved
    });

    session
        .plan
        .checks
        .iter()
        .map(|check| {
            let status = match check.check_type {
                CheckType::Constraint => {
                    if any_failed {
                        CheckStatus::Failed
                    } else {
                        CheckStatus::Passed
                    }
                }
                CheckType::Success => {
                    if any_failed {
                        CheckStatus::Failed
                    } else if any_pending {
                        CheckStatus::Pending
                    } else {
                        CheckStatus::Passed
                    }
                }
                CheckType::Safety => {
                    if high_failed {
                        CheckStatus::Failed
                    } else if high_unapproved_pending {
                        CheckStatus::Pending
                    } else {
                        CheckStatus::Passed
                    }
                }
            };
            Check {
                status,
                ..check.clone()
            }
        })
        .collect()
}

fn resolve_stop_condition(session: &Session, checks: &[Check]) -> Option<StopCondition> {
    let any_pending = session
        .actions
        .iter()
        .any(|action| action.state == ActionState::Pending);
    let any_succeeded = session
        .actions
        .iter()
        .any(|action| action.state == ActionState::Succeeded);
    let total_attempts: u32 = session.actions.iter().map(|action| action.attempts).sum();

    session
        .plan
        .stop_conditions
        .iter()
        .find(|condition| match condition {
            StopCondition::AllChecksPassed => {
                !checks.is_empty()
                    && checks.iter().all(|check| check.status == CheckStatus::Passed)
                    && !any_pending
            }
            StopCondition::MaxIterations { value } => any_pending && total_attempts >= *value,
            StopCondition::NoProgress { iterations } => {
                any_pending && !any_succeeded && total_attempts >= *iterations
            }
            StopCondition::RiskThreshold { max_risk } => session
                .actions
                .iter()
                .any(|action| action.action.risk > *max_risk && !action.approved),
            StopCondition::UserDenied => session.actions.iter().any(|action| {
                action.state == ActionState::Failed
                    && action.last_message.as_deref() == Some(REJECTION_MESSAGE)
            }),
            StopCondition::ManualStop => session.request.manual_stop(),
        })
        .cloned()
}

fn decision_for_stop(
    session: &Session,
    condition: StopCondition,
    checks: Vec<Check>,
    progress: Progress,
) -> Decision {
    let total_attempts: u32 = session.actions.iter().map(|action| action.attempts).sum();

    let (status, message, next_index) = match &condition {
        StopCondition::AllChecksPassed => (
            DecisionStatus::Completed,
            "all checks passed".to_string(),
            None,
        ),
        StopCondition::RiskThreshold { max_risk } => {
            let gated = session.actions.iter().enumerate().find(|(_, action)| {
                action.action.risk > *max_risk
                    && !action.approved
                    && action.state == ActionState::Pending
            });
            match gated {
                Some((index, action)) => (
                    DecisionStatus::AwaitingApproval,
                    format!(
                        "action #{index} ({}) exceeds risk threshold {max_risk} and requires approval",
                        action.action.command
                    ),
                    Some(index),
                ),
                None => (
                    DecisionStatus::Failed,
                    format!("risk threshold {max_risk} exceeded with no pending action to approve"),
                    first_in_state(session, ActionState::Failed),
                ),
            }
        }
        StopCondition::MaxIterations { value } => (
            DecisionStatus::Failed,
            format!("stopping: iteration limit {value} reached after {total_attempts} attempts"),
            first_in_state(session, ActionState::Pending),
        ),
        StopCondition::NoProgress { iterations } => (
            DecisionStatus::Failed,
            format!(
                "stopping: no progress after {total_attempts} attempts (limit {iterations})"
            ),
            first_in_state(session, ActionState::Pending),
        ),
        StopCondition::UserDenied => (
            DecisionStatus::Failed,
            "stopping: an action was rejected by the user".to_string(),
            session
                .actions
                .iter()
                .position(|action| {
                    action.state == ActionState::Failed
                        && action.last_message.as_deref() == Some(REJECTION_MESSAGE)
                }),
        ),
        StopCondition::ManualStop => (
            DecisionStatus::Failed,
            "stopping: manual stop requested".to_string(),
            first_in_state(session, ActionState::Pending)
                .or_else(|| first_in_state(session, ActionState::Failed)),
        ),
    };

    Decision {
        session_id: session.id.clone(),
        status,
        summary: session.plan.summary.clone(),
        steps: session.plan.steps.clone(),
        checks,
        stop_condition: Some(condition),
        message: Some(message),
        progress,
        next_action: next_index.map(|index| next_action_detail(&session.actions[index], index)),
    }
}

fn decision_for_progress(session: &Session, checks: Vec<Check>, progress: Progress) -> Decision {
    let (status, message, next_index) = if let Some(index) =
        first_in_state(session, ActionState::Failed)
    {
        let action = &session.actions[index];
        let detail = action
            .last_message
            .clone()
            .unwrap_or_else(|| "no detail".to_string());
        (
            DecisionStatus::Failed,
            format!(
                "action #{index} ({}) failed after {} of {} attempts: {detail}",
                action.action.command,
                action.attempts,
                session.max_retries + 1
            ),
            Some(index),
        )
    } else if let Some(index) = first_in_state(session, ActionState::Pending) {
        let action = &session.actions[index];
        if action.approved {
            (
                DecisionStatus::ReadyToExecute,
                format!(
                    "executing action #{index} ({}): attempt {} of {}",
                    action.action.command,
                    action.attempts + 1,
                    session.max_retries + 1
                ),
                Some(index),
            )
        } else {
            let message = action.last_message.clone().unwrap_or_else(|| {
                format!(
                    "action #{index} ({}) requires approval",
                    action.action.command
                )
            });
            (DecisionStatus::AwaitingApproval, message, Some(index))
        }
    } else {
        (
            DecisionStatus::Completed,
            "all actions completed".to_string(),
            None,
        )
    };

    Decision {
        session_id: session.id.clone(),
        status,
        summary: session.plan.summary.clone(),
        steps: session.plan.steps.clone(),
        checks,
        stop_condition: None,
        message: Some(message),
        progress,
        next_action: next_index.map(|index| next_action_detail(&session.actions[index], index)),
    }
}

fn first_in_state(session: &Session, state: ActionState) -> Option<usize> {
    session
        .actions
        .iter()
        .position(|action| action.state == state)
}

fn next_action_detail(action: &SessionAction, index: usize) -> NextAction {
    NextAction {
        index,
        action: action.action.clone(),
        state: action.state,
        attempts: action.attempts,
        approved: action.approved,
    }
}
