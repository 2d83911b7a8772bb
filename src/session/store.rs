use super::types::{ActionOutcome, ExecuteRequest, Session};
use crate::decision::{Decision, evaluate};
use crate::error::SessionError;
use crate::plan::Plan;
use crate::policy::{PolicyConfig, annotate_plan};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Owner of every live session.
///
/// The outer lock guards only the id → session map (insert and lookup); each
/// transition then serializes on its own session's lock, so unrelated
/// sessions make progress independently and two concurrent calls against the
/// same session cannot interleave their read-modify-write.
pub struct SessionStore {
    config: PolicyConfig,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Classify a validated plan, build the session, and return the first
    /// decision. The plan is assumed schema-valid; policy denials surface as
    /// failed action states, not errors.
    pub fn create_session(&self, request: ExecuteRequest, plan: Plan) -> Decision {
        let classified = annotate_plan(&plan.actions, &self.config, request.mode);
        let mut session = Session::new(request, plan, classified);
        session.advance_iteration();

        let decision = evaluate(&session);
        tracing::info!(
            session = %session.id,
            actions = session.actions.len(),
            max_iterations = session.max_iterations,
            "session created"
        );

        let id = session.id.clone();
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(session)));

        decision
    }

    /// Apply an externally-reported outcome (if any), advance the iteration
    /// window, and return the recomputed decision.
    pub fn report_outcome(
        &self,
        session_id: &str,
        outcome: Option<ActionOutcome>,
    ) -> Result<Decision, SessionError> {
        let session = self.session(session_id)?;
        let mut session = session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(outcome) = outcome {
            session.apply_outcome(outcome.index, outcome.ok, outcome.message)?;
        }
        session.advance_iteration();
        Ok(evaluate(&session))
    }

    /// Grant or reject approval for a pending action.
    pub fn approve_action(
        &self,
        session_id: &str,
        index: usize,
        approved: bool,
    ) -> Result<Decision, SessionError> {
        let session = self.session(session_id)?;
        let mut session = session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        session.apply_approval(index, approved)?;
        Ok(evaluate(&session))
    }

    /// Re-attempt iteration advancement and recompute the decision. Used
    /// after external state changes (e.g. a manual-stop flag flip).
    pub fn resume_session(&self, session_id: &str) -> Result<Decision, SessionError> {
        let session = self.session(session_id)?;
        let mut session = session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        session.advance_iteration();
        Ok(evaluate(&session))
    }

    /// Clone the current session state for observability. The core never
    /// deletes sessions; eviction belongs to whoever owns lifetime limits.
    pub fn session_snapshot(&self, session_id: &str) -> Result<Session, SessionError> {
        let session = self.session(session_id)?;
        let session = session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(session.clone())
    }

    fn session(&self, session_id: &str) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }
}
