use crate::action::Action;
use crate::error::SessionError;
use crate::plan::{Plan, StopCondition};
use crate::policy::{Classification, ExecutionMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed message recorded when an approval is rejected. The decision engine
/// matches on it verbatim for the `user_denied` stop condition.
pub const REJECTION_MESSAGE: &str = "action rejected by user";

/// Execution state of one wrapped plan action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionState {
    Pending,
    Succeeded,
    Failed,
}

/// Externally-reported result of executing one action against the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub index: usize,
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// The caller's original request, carried on the session for its lifetime.
///
/// `context` is arbitrary host state the core passes through untouched; the
/// single key it reads is the `manual_stop` boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub prompt: String,
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ExecuteRequest {
    pub fn manual_stop(&self) -> bool {
        self.context
            .get("manual_stop")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

/// One plan action plus its mutable execution state. Owned exclusively by its
/// session; never shared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionAction {
    pub action: Action,
    pub approved: bool,
    pub state: ActionState,
    pub attempts: u32,
    pub last_message: Option<String>,
    pub estimated_changes: u64,
}

impl From<Classification> for SessionAction {
    fn from(classification: Classification) -> Self {
        let state = if classification.hard_denied {
            ActionState::Failed
        } else {
            ActionState::Pending
        };
        Self {
            action: classification.action,
            approved: classification.approved && state == ActionState::Pending,
            state,
            attempts: 0,
            last_message: classification.message,
            estimated_changes: classification.estimated_changes,
        }
    }
}

/// One in-progress execution of a plan's action list.
///
/// Mutated in place by every store transition; never deleted by the core
/// (stale-session eviction is an external concern).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub request: ExecuteRequest,
    pub plan: Plan,
    pub max_retries: u32,
    pub actions: Vec<SessionAction>,
    pub current_iteration: u32,
    pub max_iterations: u32,
    pub actions_per_iteration: usize,
    pub iteration_start: usize,
    pub checkpoint_pending: bool,
    pub checkpoint_action: Option<usize>,
}

impl Session {
    pub(crate) fn new(
        request: ExecuteRequest,
        plan: Plan,
        classified: Vec<Classification>,
    ) -> Self {
        let actions: Vec<SessionAction> =
            classified.into_iter().map(SessionAction::from).collect();

        let max_iterations = plan
            .stop_conditions
            .iter()
            .find_map(|condition| match condition {
                StopCondition::MaxIterations { value } => Some((*value).max(1)),
                _ => None,
            })
            .unwrap_or(1);

        let actions_per_iteration = actions
            .len()
            .div_ceil(max_iterations as usize)
            .max(1);

        let max_retries = request.max_retries;

        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            request,
            plan,
            max_retries,
            actions,
            current_iteration: 0,
            max_iterations,
            actions_per_iteration,
            iteration_start: 0,
            checkpoint_pending: false,
            checkpoint_action: None,
        }
    }

    /// Move the iteration window forward when the first pending action has
    /// left it, inserting an approval checkpoint at the boundary if the
    /// action there is still unapproved.
    pub(crate) fn advance_iteration(&mut self) {
        let Some(first_pending) = self
            .actions
            .iter()
            .position(|action| action.state == ActionState::Pending)
        else {
            return;
        };

        let window_end = self.iteration_start + self.actions_per_iteration - 1;
        if (self.iteration_start..=window_end).contains(&first_pending) {
            return;
        }

        if self.current_iteration + 1 >= self.max_iterations {
            return;
        }

        self.current_iteration += 1;
        self.iteration_start = first_pending;
        self.checkpoint_pending = false;
        self.checkpoint_action = None;

        if !self.actions[first_pending].approved {
            self.checkpoint_pending = true;
            self.checkpoint_action = Some(first_pending);
            self.actions[first_pending].last_message = Some(format!(
                "iteration {} checkpoint: approve action {first_pending} before this iteration can proceed",
                self.current_iteration
            ));
            tracing::info!(
                session = %self.id,
                iteration = self.current_iteration,
                action = first_pending,
                "iteration checkpoint set"
            );
        }
    }

    /// Apply one externally-reported outcome. Fails with no mutation when the
    /// index is out of range or the action is not pending.
    pub(crate) fn apply_outcome(
        &mut self,
        index: usize,
        ok: bool,
        message: Option<String>,
    ) -> Result<(), SessionError> {
        let len = self.actions.len();
        let Some(action) = self.actions.get_mut(index) else {
            return Err(SessionError::ActionOutOfRange { index, len });
        };
        if action.state != ActionState::Pending {
            return Err(SessionError::ActionNotPending {
                index,
                state: action.state,
            });
        }

        action.attempts += 1;
        if let Some(message) = message {
            action.last_message = Some(message);
        }

        if ok {
            action.state = ActionState::Succeeded;
        } else if action.attempts >= self.max_retries + 1 {
            // Retry budget exhausted; the failure is terminal.
            action.state = ActionState::Failed;
        }

        tracing::debug!(
            session = %self.id,
            action = index,
            attempts = action.attempts,
            state = %action.state,
            "outcome applied"
        );
        Ok(())
    }

    /// Grant or reject approval for a pending action. Rejection is terminal
    /// regardless of retry budget.
    pub(crate) fn apply_approval(
        &mut self,
        index: usize,
        approved: bool,
    ) -> Result<(), SessionError> {
        let len = self.actions.len();
        let Some(action) = self.actions.get_mut(index) else {
            return Err(SessionError::ActionOutOfRange { index, len });
        };
        if action.state != ActionState::Pending {
            return Err(SessionError::ActionNotPending {
                index,
                state: action.state,
            });
        }

        action.approved = approved;
        if !approved {
            action.state = ActionState::Failed;
            action.last_message = Some(REJECTION_MESSAGE.to_string());
        }

        if self.checkpoint_action == Some(index) {
            self.checkpoint_pending = false;
            self.checkpoint_action = None;
        }

        tracing::info!(
            session = %self.id,
            action = index,
            approved,
            "approval recorded"
        );
        Ok(())
    }
}
