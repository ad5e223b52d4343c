// error.rs — Error types for goal lifecycle operations.

use thiserror::Error;

use crate::goal_id::GoalId;
use crate::status::{GoalEvent, GoalStatus};

/// Errors that can occur while driving a goal's lifecycle.
#[derive(Debug, Error)]
pub enum GoalError {
    /// The requested event is not legal from the goal's current state.
    ///
    /// This is also how the cancel-vs-completion race surfaces: a handle that
    /// reached a terminal state first rejects the `cancel_goal` event.
    #[error("illegal transition for goal {goal_id}: event {event} from state {from}")]
    InvalidTransition {
        goal_id: GoalId,
        from: GoalStatus,
        event: GoalEvent,
    },
}
