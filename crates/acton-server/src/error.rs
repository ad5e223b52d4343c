// error.rs — Error types for the action server engine.
//
// Only genuinely fatal-or-surfaceable conditions live here. The protocol's
// recoverable conditions are deliberately *not* variants: an untracked goal
// in a cancel filter is a warning log plus an unknown-goal return code, a
// transition attempted on an already-terminal handle is an expected race,
// and a take that misses after a readiness signal is an idle pass.

use thiserror::Error;

use acton_goal::{GoalError, GoalId};
use acton_transport::TransportError;

/// Errors surfaced by [`crate::ActionServer`] and its components.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Fatal at construction: the server was configured incoherently.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A goal identity is already registered. Never overwrites; the
    /// acceptance pipeline turns this into a rejected response.
    #[error("goal {0} is already registered")]
    DuplicateGoal(GoalId),

    /// A lifecycle transition failed.
    #[error(transparent)]
    Goal(#[from] GoalError),

    /// The underlying channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server was used after `dispose()`.
    #[error("action server used after dispose")]
    Disposed,
}
