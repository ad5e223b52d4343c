// handle.rs — ServerGoalHandle: per-goal state container.
//
// The registry holds the canonical copy behind an Arc; the accepted-callback
// and the action's business logic hold clones of the same Arc. The identity
// and payload never change after creation. The status field is the one piece
// of shared mutable state: the dispatch loop's cancel path and the business
// logic's completion path race on it, so every transition is applied
// compare-and-swap style under the handle's own lock — the event is checked
// against the state at apply time, not the state the caller last observed.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::GoalError;
use crate::goal_id::{GoalId, GoalInfo};
use crate::status::{GoalEvent, GoalStatus};

struct LifecycleState<R> {
    status: GoalStatus,
    result: Option<R>,
    terminal_at: Option<DateTime<Utc>>,
}

/// Server-side state for one accepted goal.
///
/// `G` is the action's goal payload type, `R` its result type — both opaque
/// to the lifecycle engine.
pub struct ServerGoalHandle<G, R> {
    goal_id: GoalId,
    goal: G,
    accepted_at: DateTime<Utc>,
    state: Mutex<LifecycleState<R>>,
}

impl<G, R> ServerGoalHandle<G, R> {
    /// Create a handle in the `Accepted` state, stamped now.
    ///
    /// Only the acceptance pipeline constructs handles; a rejected submission
    /// never produces one.
    pub fn new(goal_id: GoalId, goal: G) -> Self {
        Self {
            goal_id,
            goal,
            accepted_at: Utc::now(),
            state: Mutex::new(LifecycleState {
                status: GoalStatus::Accepted,
                result: None,
                terminal_at: None,
            }),
        }
    }

    pub fn goal_id(&self) -> GoalId {
        self.goal_id
    }

    /// The deserialized goal payload as submitted by the client.
    pub fn goal(&self) -> &G {
        &self.goal
    }

    pub fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }

    /// Identity + acceptance stamp, as carried in cancel responses.
    pub fn goal_info(&self) -> GoalInfo {
        GoalInfo {
            goal_id: self.goal_id,
            stamp: self.accepted_at,
        }
    }

    /// The current lifecycle status.
    pub fn status(&self) -> GoalStatus {
        self.lock().status
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Whether a cancel was accepted and the business logic should wind down.
    pub fn is_canceling(&self) -> bool {
        self.status() == GoalStatus::Canceling
    }

    /// When the goal reached a terminal state, if it has.
    pub fn terminal_at(&self) -> Option<DateTime<Utc>> {
        self.lock().terminal_at
    }

    /// Request a lifecycle transition.
    ///
    /// The event is validated against the state held at this instant, under
    /// the lock. Illegal transitions are reported, never silently ignored —
    /// callers racing a completed goal see `GoalError::InvalidTransition`
    /// and decide how to treat it.
    pub fn request_transition(&self, event: GoalEvent) -> Result<GoalStatus, GoalError> {
        self.transition_with(event, None)
    }

    /// Mark the goal as executing.
    pub fn execute(&self) -> Result<(), GoalError> {
        self.request_transition(GoalEvent::Execute).map(|_| ())
    }

    /// Terminal transition: the goal completed successfully.
    pub fn succeed(&self, result: R) -> Result<(), GoalError> {
        self.transition_with(GoalEvent::Succeed, Some(result))
            .map(|_| ())
    }

    /// Terminal transition: the goal failed.
    pub fn abort(&self, result: R) -> Result<(), GoalError> {
        self.transition_with(GoalEvent::Abort, Some(result))
            .map(|_| ())
    }

    /// Terminal transition: the business logic honored a pending cancel.
    pub fn canceled(&self, result: R) -> Result<(), GoalError> {
        self.transition_with(GoalEvent::Canceled, Some(result))
            .map(|_| ())
    }

    // Transition and result assignment happen under one lock acquisition so
    // a concurrent reader never sees a terminal status without its result.
    fn transition_with(&self, event: GoalEvent, result: Option<R>) -> Result<GoalStatus, GoalError> {
        let mut state = self.lock();
        let next = state
            .status
            .apply(event)
            .ok_or(GoalError::InvalidTransition {
                goal_id: self.goal_id,
                from: state.status,
                event,
            })?;
        state.status = next;
        if let Some(result) = result {
            state.result = Some(result);
        }
        if next.is_terminal() && state.terminal_at.is_none() {
            state.terminal_at = Some(Utc::now());
        }
        Ok(next)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LifecycleState<R>> {
        // A poisoned lock means a panic landed between two field writes that
        // are individually always valid; recovering is safe.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<G, R: Clone> ServerGoalHandle<G, R> {
    /// The stored terminal result, if the goal has produced one.
    pub fn result(&self) -> Option<R> {
        self.lock().result.clone()
    }
}

impl<G: std::fmt::Debug, R> std::fmt::Debug for ServerGoalHandle<G, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerGoalHandle")
            .field("goal_id", &self.goal_id)
            .field("goal", &self.goal)
            .field("status", &self.status())
            .finish()
    }
}
