// cancel.rs — The cancellation negotiator.
//
// Matching rule: a nil goal identity in the request matches every active
// goal (optionally bounded by acceptance time, inclusive); a concrete
// identity matches exactly that goal. For each candidate the user cancel
// policy runs once; on acceptance the handle's transition to Canceling is
// attempted compare-and-swap style. A candidate whose execution completed
// in the meantime loses that race and is excluded from the response — an
// expected outcome, not an error. The response carries exactly the goals
// for which both the policy accepted and the transition succeeded.

use acton_goal::{GoalEvent, GoalInfo};
use acton_transport::{
    ActionChannel, ActionTypes, CancelGoalRequest, CancelGoalResponse, CancelReturnCode,
};

use crate::error::ServerError;
use crate::registry::GoalHandle;
use crate::server::{ActionServer, CancelDecision};

impl<A: ActionTypes, C: ActionChannel<A>> ActionServer<A, C> {
    /// Drain one pending cancel request, if the take finds one.
    pub(crate) fn process_cancel_request(&mut self) -> Result<(), ServerError> {
        let Some((correlation, request)) = self.channel.take_cancel_request()? else {
            tracing::trace!(
                action = %self.options.action_name,
                "cancel readiness raced with another consumer; nothing taken"
            );
            return Ok(());
        };
        let response = self.negotiate_cancel(&request);
        self.channel.send_cancel_response(correlation, response)?;
        Ok(())
    }

    fn negotiate_cancel(&self, request: &CancelGoalRequest) -> CancelGoalResponse {
        let mut early_return_code = None;
        let candidates: Vec<GoalHandle<A>> = if request.goal_id.is_nil() {
            // Match-all: every non-terminal goal inside the time bound,
            // processed in snapshot iteration order.
            self.registry
                .snapshot()
                .into_iter()
                .filter(|handle| {
                    handle.status().is_active() && request.within_time_bound(handle.accepted_at())
                })
                .collect()
        } else {
            match self.registry.lookup(request.goal_id) {
                Some(handle) if handle.is_terminal() => {
                    early_return_code = Some(CancelReturnCode::GoalTerminated);
                    Vec::new()
                }
                Some(handle) => vec![handle],
                None => {
                    // Stale cancel requests are routine: the goal may have
                    // completed and been reaped, or belong to another server.
                    tracing::warn!(
                        action = %self.options.action_name,
                        goal_id = %request.goal_id,
                        "cancel request names an untracked goal; skipping"
                    );
                    early_return_code = Some(CancelReturnCode::UnknownGoalId);
                    Vec::new()
                }
            }
        };

        let had_candidates = !candidates.is_empty();
        let mut goals_canceling: Vec<GoalInfo> = Vec::new();
        for handle in candidates {
            if self.invoke_cancel_policy(&handle) == CancelDecision::Reject {
                continue;
            }
            match handle.request_transition(GoalEvent::CancelGoal) {
                Ok(_) => goals_canceling.push(handle.goal_info()),
                Err(_) => {
                    // Policy said yes, but the goal finished (or was already
                    // canceling) before the transition could apply.
                    tracing::debug!(
                        action = %self.options.action_name,
                        goal_id = %handle.goal_id(),
                        status = %handle.status(),
                        "goal left cancelable state before cancel applied; excluded"
                    );
                }
            }
        }

        let return_code = match early_return_code {
            Some(code) => code,
            None if had_candidates && goals_canceling.is_empty() => CancelReturnCode::Rejected,
            None => CancelReturnCode::None,
        };
        CancelGoalResponse {
            return_code,
            goals_canceling,
        }
    }
}
