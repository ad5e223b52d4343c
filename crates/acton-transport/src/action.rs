// action.rs — Action message contracts.
//
// An action bundles four exchanges over three request channels: submit a
// goal, cancel goals, fetch a result (feedback is a plain publication and
// carries no server-side state). The payload types are owned by the action
// definition; the engine treats them as opaque. ActionTypes ties them
// together at compile time, so no runtime downcasting is ever needed to
// recover a concrete message type from a stored callback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use acton_goal::{GoalId, GoalInfo, GoalStatus};

/// Compile-time description of one action type.
///
/// Implemented by a unit struct per action (see [`crate::memory::Fibonacci`]
/// for an example). The engine is generic over this trait.
pub trait ActionTypes: Send + Sync + 'static {
    /// The goal payload a client submits.
    type Goal: Clone + Send + Sync + 'static;
    /// The result payload the server eventually reports.
    type Result: Clone + Send + Sync + 'static;
}

/// A goal submission: client-chosen identity plus the goal payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGoalRequest<G> {
    pub goal_id: GoalId,
    pub goal: G,
}

/// The server's answer to a goal submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGoalResponse {
    /// Whether the goal was admitted. A rejected goal is never tracked.
    pub accepted: bool,
    /// Acceptance time on accept; response time on reject.
    pub stamp: DateTime<Utc>,
}

/// A request to cancel one goal, or every active goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelGoalRequest {
    /// The goal to cancel. A nil identity means "match every active goal".
    pub goal_id: GoalId,

    /// Optional time bound, honored only with the nil identity: restrict the
    /// match to goals accepted at or before this instant (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_before: Option<DateTime<Utc>>,
}

impl CancelGoalRequest {
    /// Cancel a single goal by identity.
    pub fn single(goal_id: GoalId) -> Self {
        Self {
            goal_id,
            accepted_before: None,
        }
    }

    /// Cancel every active goal.
    pub fn all() -> Self {
        Self {
            goal_id: GoalId::nil(),
            accepted_before: None,
        }
    }

    /// Whether a goal accepted at `accepted_at` falls inside this request's
    /// time bound. The bound is inclusive; an absent bound matches everything.
    pub fn within_time_bound(&self, accepted_at: DateTime<Utc>) -> bool {
        match self.accepted_before {
            Some(bound) => accepted_at <= bound,
            None => true,
        }
    }
}

/// Protocol-level outcome of a cancel request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelReturnCode {
    /// The request was processed; see `goals_canceling` for matches.
    None,
    /// Candidates matched but none were accepted for cancellation.
    Rejected,
    /// The named goal is not tracked by this server.
    UnknownGoalId,
    /// The named goal already reached a terminal state.
    GoalTerminated,
}

/// The server's answer to a cancel request: exactly the goals for which the
/// cancel policy accepted *and* the transition to canceling succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelGoalResponse {
    pub return_code: CancelReturnCode,
    pub goals_canceling: Vec<GoalInfo>,
}

/// A request for a goal's terminal result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResultRequest {
    pub goal_id: GoalId,
}

/// The server's answer to a result request.
///
/// `status` is `Unknown` for untracked goals; `result` is populated only
/// once the goal is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResultResponse<R> {
    pub status: GoalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
}
