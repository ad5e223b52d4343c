//! # acton-goal
//!
//! Goal identity and lifecycle tracking for the Acton action protocol.
//!
//! An action is a long-running, cancelable remote task. Clients submit goals
//! identified by a UUID; the server tracks each accepted goal through a
//! well-defined state machine until it reaches a terminal state.
//!
//! ## Key components
//!
//! - [`GoalId`] — client-supplied goal identity (UUID, compared by bytes)
//! - [`GoalStatus`] / [`GoalEvent`] — the lifecycle state machine
//!   (Accepted → Executing → Succeeded/Aborted/Canceled, with a one-way
//!   Canceling detour for cancellation negotiation)
//! - [`ServerGoalHandle`] — per-goal state container shared between the
//!   dispatch loop and the action's business logic
//! - [`GoalInfo`] — goal id + acceptance stamp pair used in cancel responses

pub mod error;
pub mod goal_id;
pub mod handle;
pub mod status;

pub use error::GoalError;
pub use goal_id::{GoalId, GoalInfo};
pub use handle::ServerGoalHandle;
pub use status::{GoalEvent, GoalStatus};
