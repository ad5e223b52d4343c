// status.rs — The goal lifecycle state machine.
//
// The state graph:
//
//   Accepted → Executing → Succeeded | Aborted
//   Accepted | Executing → Canceling → Canceled
//   Canceling → Succeeded | Aborted   (execution finished before the cancel
//                                      could be honored — a legitimate race)
//
// Succeeded, Aborted, and Canceled are terminal: no transition leaves them.
// Canceling is one-way — once a cancel is accepted the goal either ends in
// Canceled or in whatever terminal state its own execution reaches first.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a goal.
///
/// `Unknown` never appears in a registered handle; it is the status a result
/// response reports for a goal this server does not track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// The goal is not tracked by this server.
    Unknown,

    /// Admitted by the goal policy; execution has not started.
    Accepted,

    /// The action's business logic is working on the goal.
    Executing,

    /// A cancel request was accepted; awaiting the business logic's reaction.
    Canceling,

    /// Terminal: the goal completed successfully.
    Succeeded,

    /// Terminal: the goal was canceled before completing.
    Canceled,

    /// Terminal: the goal failed.
    Aborted,
}

impl GoalStatus {
    /// Whether this is a terminal state (no further transitions permitted).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GoalStatus::Succeeded | GoalStatus::Canceled | GoalStatus::Aborted
        )
    }

    /// Whether the goal is still live on the server (tracked and non-terminal).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            GoalStatus::Accepted | GoalStatus::Executing | GoalStatus::Canceling
        )
    }

    /// The state this event leads to, or `None` if the event is illegal here.
    pub fn apply(&self, event: GoalEvent) -> Option<GoalStatus> {
        match (self, event) {
            (GoalStatus::Accepted, GoalEvent::Execute) => Some(GoalStatus::Executing),
            (GoalStatus::Accepted, GoalEvent::CancelGoal) => Some(GoalStatus::Canceling),
            (GoalStatus::Executing, GoalEvent::CancelGoal) => Some(GoalStatus::Canceling),
            (GoalStatus::Executing, GoalEvent::Succeed) => Some(GoalStatus::Succeeded),
            (GoalStatus::Executing, GoalEvent::Abort) => Some(GoalStatus::Aborted),
            (GoalStatus::Canceling, GoalEvent::Canceled) => Some(GoalStatus::Canceled),
            (GoalStatus::Canceling, GoalEvent::Succeed) => Some(GoalStatus::Succeeded),
            (GoalStatus::Canceling, GoalEvent::Abort) => Some(GoalStatus::Aborted),
            _ => None,
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalStatus::Unknown => "unknown",
            GoalStatus::Accepted => "accepted",
            GoalStatus::Executing => "executing",
            GoalStatus::Canceling => "canceling",
            GoalStatus::Succeeded => "succeeded",
            GoalStatus::Canceled => "canceled",
            GoalStatus::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// The transition alphabet for the goal state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalEvent {
    /// Business logic started working on the goal.
    Execute,
    /// A cancel request was accepted for the goal.
    CancelGoal,
    /// Business logic finished the goal successfully.
    Succeed,
    /// Business logic failed the goal.
    Abort,
    /// Business logic honored a pending cancel.
    Canceled,
}

impl fmt::Display for GoalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalEvent::Execute => "execute",
            GoalEvent::CancelGoal => "cancel_goal",
            GoalEvent::Succeed => "succeed",
            GoalEvent::Abort => "abort",
            GoalEvent::Canceled => "canceled",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        assert_eq!(
            GoalStatus::Accepted.apply(GoalEvent::Execute),
            Some(GoalStatus::Executing)
        );
        assert_eq!(
            GoalStatus::Executing.apply(GoalEvent::Succeed),
            Some(GoalStatus::Succeeded)
        );
    }

    #[test]
    fn cancel_detour_transitions() {
        assert_eq!(
            GoalStatus::Accepted.apply(GoalEvent::CancelGoal),
            Some(GoalStatus::Canceling)
        );
        assert_eq!(
            GoalStatus::Executing.apply(GoalEvent::CancelGoal),
            Some(GoalStatus::Canceling)
        );
        assert_eq!(
            GoalStatus::Canceling.apply(GoalEvent::Canceled),
            Some(GoalStatus::Canceled)
        );
    }

    #[test]
    fn canceling_goal_can_still_finish() {
        // The execution side may complete before the cancel is honored.
        assert_eq!(
            GoalStatus::Canceling.apply(GoalEvent::Succeed),
            Some(GoalStatus::Succeeded)
        );
        assert_eq!(
            GoalStatus::Canceling.apply(GoalEvent::Abort),
            Some(GoalStatus::Aborted)
        );
    }

    #[test]
    fn terminal_states_accept_no_events() {
        for terminal in [
            GoalStatus::Succeeded,
            GoalStatus::Canceled,
            GoalStatus::Aborted,
        ] {
            for event in [
                GoalEvent::Execute,
                GoalEvent::CancelGoal,
                GoalEvent::Succeed,
                GoalEvent::Abort,
                GoalEvent::Canceled,
            ] {
                assert_eq!(terminal.apply(event), None, "{terminal} should reject {event}");
            }
        }
    }

    #[test]
    fn accepted_cannot_skip_to_terminal() {
        assert_eq!(GoalStatus::Accepted.apply(GoalEvent::Succeed), None);
        assert_eq!(GoalStatus::Accepted.apply(GoalEvent::Abort), None);
        assert_eq!(GoalStatus::Accepted.apply(GoalEvent::Canceled), None);
    }

    #[test]
    fn terminal_and_active_partition() {
        assert!(GoalStatus::Succeeded.is_terminal());
        assert!(GoalStatus::Canceled.is_terminal());
        assert!(GoalStatus::Aborted.is_terminal());
        assert!(GoalStatus::Accepted.is_active());
        assert!(GoalStatus::Executing.is_active());
        assert!(GoalStatus::Canceling.is_active());
        assert!(!GoalStatus::Unknown.is_active());
        assert!(!GoalStatus::Unknown.is_terminal());
    }

    #[test]
    fn status_display_is_snake_case() {
        assert_eq!(GoalStatus::Canceling.to_string(), "canceling");
        assert_eq!(GoalEvent::CancelGoal.to_string(), "cancel_goal");
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&GoalStatus::Executing).unwrap();
        assert_eq!(json, "\"executing\"");
    }
}
