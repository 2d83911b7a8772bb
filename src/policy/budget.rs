use super::{Classification, ExecutionMode, PolicyConfig, classify};
use crate::action::Action;

/// Classify an ordered action list while enforcing the session change budget.
///
/// The running total accumulates each action's estimate in order. The first
/// action whose inclusion would exceed `max_session_change_units` is
/// hard-denied and contributes nothing; accounting continues for later
/// actions against the same running total, so a smaller follow-up action may
/// still be admitted. Actions already hard-denied by per-kind rules never
/// enter the total.
pub fn annotate_plan(
    actions: &[Action],
    config: &PolicyConfig,
    mode: ExecutionMode,
) -> Vec<Classification> {
    let mut total: u64 = 0;

    actions
        .iter()
        .map(|action| {
            let mut classification = classify(action, config, mode);
            if classification.hard_denied {
                return classification;
            }

            let projected = total.saturating_add(classification.estimated_changes);
            if projected > config.max_session_change_units {
                tracing::warn!(
                    command = %classification.action.command,
                    projected,
                    limit = config.max_session_change_units,
                    "action hard-denied: session change budget exceeded"
                );
                classification.hard_denied = true;
                classification.approved = false;
                classification.message = Some(format!(
                    "session change budget exceeded: {projected} estimated change-units over limit {}",
                    config.max_session_change_units
                ));
            } else {
                total = projected;
            }

            classification
        })
        .collect()
}
