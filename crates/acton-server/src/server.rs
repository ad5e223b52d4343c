// server.rs — ActionServer: the readiness-driven dispatch engine.
//
// One instance per advertised action name. An external scheduler owns the
// wait-set poll and repeatedly calls `is_ready()` then `execute()`; each
// execute pass checks the four readiness flags in a fixed order (goal,
// cancel, result, expiry) and drains exactly one pending item per ready
// channel. The scheduler spins again to drain more.
//
// Single-threaded-per-instance discipline: at most one pass runs at a time,
// so the pass itself needs no locking. The registry and each handle's
// status still do — the action's business logic completes goals on its own
// flow, concurrently with the cancel path.

use std::panic::{catch_unwind, AssertUnwindSafe};

use acton_goal::GoalStatus;
use acton_transport::{
    ActionChannel, ActionTypes, GetResultResponse, Readiness, SendGoalRequest,
};
use chrono::Utc;

use crate::error::ServerError;
use crate::options::ActionServerOptions;
use crate::registry::{GoalHandle, GoalRegistry};

/// The goal policy's verdict on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalDecision {
    Accept,
    Reject,
}

/// The cancel policy's verdict on one candidate goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDecision {
    Accept,
    Reject,
}

type GoalPolicy<A> =
    Box<dyn Fn(&SendGoalRequest<<A as ActionTypes>::Goal>) -> GoalDecision + Send + Sync>;
type CancelPolicy<A> = Box<dyn Fn(&GoalHandle<A>) -> CancelDecision + Send + Sync>;
type AcceptedNotifier<A> = Box<dyn Fn(GoalHandle<A>) + Send + Sync>;

/// The server side of one action: goal registry, user policies, and the
/// per-pass dispatch entry point.
pub struct ActionServer<A: ActionTypes, C: ActionChannel<A>> {
    pub(crate) options: ActionServerOptions,
    pub(crate) channel: C,
    pub(crate) registry: GoalRegistry<A>,
    goal_policy: GoalPolicy<A>,
    cancel_policy: CancelPolicy<A>,
    accepted_notifier: AcceptedNotifier<A>,
    readiness: Readiness,
    disposed: bool,
}

impl<A: ActionTypes, C: ActionChannel<A>> ActionServer<A, C> {
    /// Create an action server.
    ///
    /// All three policy callbacks are required — taking them by value lets
    /// the type system enforce what would otherwise be a null check. The
    /// action name must be non-empty.
    pub fn new(
        options: ActionServerOptions,
        channel: C,
        goal_policy: impl Fn(&SendGoalRequest<A::Goal>) -> GoalDecision + Send + Sync + 'static,
        cancel_policy: impl Fn(&GoalHandle<A>) -> CancelDecision + Send + Sync + 'static,
        accepted_notifier: impl Fn(GoalHandle<A>) + Send + Sync + 'static,
    ) -> Result<Self, ServerError> {
        if options.action_name.trim().is_empty() {
            return Err(ServerError::InvalidConfiguration(
                "action name must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            options,
            channel,
            registry: GoalRegistry::new(),
            goal_policy: Box::new(goal_policy),
            cancel_policy: Box::new(cancel_policy),
            accepted_notifier: Box::new(accepted_notifier),
            readiness: Readiness::default(),
            disposed: false,
        })
    }

    pub fn action_name(&self) -> &str {
        &self.options.action_name
    }

    /// The goal registry. Exposed for result storage lookups and tests.
    pub fn registry(&self) -> &GoalRegistry<A> {
        &self.registry
    }

    /// Refresh the readiness snapshot from the channel.
    ///
    /// Returns whether any entity is ready — i.e. whether `execute()` has
    /// work to do this pass.
    pub fn is_ready(&mut self) -> Result<bool, ServerError> {
        self.ensure_live()?;
        self.readiness = self.channel.readiness();
        Ok(self.readiness.any())
    }

    /// Run one dispatch pass over the snapshot taken by `is_ready()`.
    ///
    /// Each ready channel is handled independently and in fixed order, and
    /// drained of exactly one pending item. A pass with nothing ready is a
    /// normal idle pass, not an error.
    pub fn execute(&mut self) -> Result<(), ServerError> {
        self.ensure_live()?;
        let ready = std::mem::take(&mut self.readiness);

        if ready.goal_request {
            self.process_goal_request()?;
        }
        if ready.cancel_request {
            self.process_cancel_request()?;
        }
        if ready.result_request {
            self.process_result_request()?;
        }
        if ready.goal_expired {
            self.reap_expired_goals();
        }
        Ok(())
    }

    /// Answer a result request with the goal's current status, plus its
    /// result when terminal. Untracked goals report `Unknown`.
    fn process_result_request(&mut self) -> Result<(), ServerError> {
        let Some((correlation, request)) = self.channel.take_result_request()? else {
            tracing::trace!(
                action = %self.options.action_name,
                "result readiness raced with another consumer; nothing taken"
            );
            return Ok(());
        };

        let response = match self.registry.lookup(request.goal_id) {
            Some(handle) => GetResultResponse {
                status: handle.status(),
                result: handle.result(),
            },
            None => {
                tracing::warn!(
                    action = %self.options.action_name,
                    goal_id = %request.goal_id,
                    "result requested for untracked goal"
                );
                GetResultResponse {
                    status: GoalStatus::Unknown,
                    result: None,
                }
            }
        };
        self.channel.send_result_response(correlation, response)?;
        Ok(())
    }

    /// Remove terminal goals whose result-availability window has elapsed.
    fn reap_expired_goals(&mut self) {
        let Ok(timeout) = chrono::Duration::from_std(self.options.result_timeout) else {
            // A timeout too large for the calendar type means "never expire".
            return;
        };
        let now = Utc::now();
        for handle in self.registry.snapshot() {
            let Some(terminal_at) = handle.terminal_at() else {
                continue;
            };
            if now - terminal_at >= timeout {
                self.registry.remove(handle.goal_id());
                tracing::debug!(
                    action = %self.options.action_name,
                    goal_id = %handle.goal_id(),
                    status = %handle.status(),
                    "reaped expired goal"
                );
            }
        }
    }

    /// Release every registered goal handle and retire the server.
    ///
    /// Idempotent. The owner drops its reference afterwards; any further
    /// `is_ready()`/`execute()` call fails with `ServerError::Disposed`.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let released = self.registry.len();
        self.registry.clear();
        self.readiness = Readiness::default();
        self.disposed = true;
        tracing::debug!(
            action = %self.options.action_name,
            released,
            "action server disposed"
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) -> Result<(), ServerError> {
        if self.disposed {
            return Err(ServerError::Disposed);
        }
        Ok(())
    }

    /// Run the goal policy with a panic guard: a misbehaving callback is
    /// logged and treated as a reject for this one submission only.
    pub(crate) fn invoke_goal_policy(&self, request: &SendGoalRequest<A::Goal>) -> GoalDecision {
        match catch_unwind(AssertUnwindSafe(|| (self.goal_policy)(request))) {
            Ok(decision) => decision,
            Err(_) => {
                tracing::error!(
                    action = %self.options.action_name,
                    goal_id = %request.goal_id,
                    "goal policy panicked; rejecting submission"
                );
                GoalDecision::Reject
            }
        }
    }

    /// Run the cancel policy with the same panic guard and reject fallback.
    pub(crate) fn invoke_cancel_policy(&self, handle: &GoalHandle<A>) -> CancelDecision {
        match catch_unwind(AssertUnwindSafe(|| (self.cancel_policy)(handle))) {
            Ok(decision) => decision,
            Err(_) => {
                tracing::error!(
                    action = %self.options.action_name,
                    goal_id = %handle.goal_id(),
                    "cancel policy panicked; rejecting cancellation"
                );
                CancelDecision::Reject
            }
        }
    }

    /// Fire the accepted notifier. Happens-after registry insertion; a
    /// panicking notifier must not abort the rest of the pass.
    pub(crate) fn notify_accepted(&self, handle: GoalHandle<A>) {
        let goal_id = handle.goal_id();
        if catch_unwind(AssertUnwindSafe(|| (self.accepted_notifier)(handle))).is_err() {
            tracing::error!(
                action = %self.options.action_name,
                goal_id = %goal_id,
                "accepted notifier panicked; goal remains registered"
            );
        }
    }
}
