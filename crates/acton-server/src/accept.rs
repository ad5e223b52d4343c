// accept.rs — The goal acceptance pipeline.
//
// One submission per pass: take the request, decide, respond, and — only on
// acceptance — notify. Ordering rules the protocol depends on:
//
//   * a duplicate goal identity is rejected before the user policy runs
//   * the handle is constructed before it is inserted, so a failure leaves
//     no partial state in the registry
//   * the accepted notifier fires only after the insert succeeded

use std::sync::Arc;

use acton_goal::ServerGoalHandle;
use acton_transport::{ActionChannel, ActionTypes, SendGoalResponse};
use chrono::Utc;

use crate::error::ServerError;
use crate::registry::GoalHandle;
use crate::server::{ActionServer, GoalDecision};

impl<A: ActionTypes, C: ActionChannel<A>> ActionServer<A, C> {
    /// Drain one pending goal submission, if the take finds one.
    pub(crate) fn process_goal_request(&mut self) -> Result<(), ServerError> {
        let Some((correlation, request)) = self.channel.take_goal_request()? else {
            tracing::trace!(
                action = %self.options.action_name,
                "goal readiness raced with another consumer; nothing taken"
            );
            return Ok(());
        };

        // Duplicate identities are a protocol violation by the client.
        // Reject without consulting the user policy; the registered goal
        // must not be disturbed.
        if self.registry.lookup(request.goal_id).is_some() {
            tracing::warn!(
                action = %self.options.action_name,
                goal_id = %request.goal_id,
                "rejecting goal submission with duplicate identity"
            );
            self.channel.send_goal_response(
                correlation,
                SendGoalResponse {
                    accepted: false,
                    stamp: Utc::now(),
                },
            )?;
            return Ok(());
        }

        if self.invoke_goal_policy(&request) == GoalDecision::Reject {
            tracing::debug!(
                action = %self.options.action_name,
                goal_id = %request.goal_id,
                "goal rejected by policy"
            );
            self.channel.send_goal_response(
                correlation,
                SendGoalResponse {
                    accepted: false,
                    stamp: Utc::now(),
                },
            )?;
            return Ok(());
        }

        let handle: GoalHandle<A> =
            Arc::new(ServerGoalHandle::new(request.goal_id, request.goal.clone()));
        if let Err(err) = self.registry.insert(handle.clone()) {
            // Unreachable while passes stay single-threaded, but the insert
            // is the atomic duplicate check of record; honor its verdict.
            tracing::warn!(
                action = %self.options.action_name,
                goal_id = %request.goal_id,
                error = %err,
                "registry refused goal after policy acceptance"
            );
            self.channel.send_goal_response(
                correlation,
                SendGoalResponse {
                    accepted: false,
                    stamp: Utc::now(),
                },
            )?;
            return Ok(());
        }

        tracing::debug!(
            action = %self.options.action_name,
            goal_id = %request.goal_id,
            "goal accepted"
        );
        self.channel.send_goal_response(
            correlation,
            SendGoalResponse {
                accepted: true,
                stamp: handle.accepted_at(),
            },
        )?;

        // Happens-after the insert: the notifier may immediately look the
        // goal up through the registry.
        self.notify_accepted(handle);
        Ok(())
    }
}
