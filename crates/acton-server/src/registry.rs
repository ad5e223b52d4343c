// registry.rs — GoalRegistry: the authoritative goal-id → handle map.
//
// A handle is in the registry iff its goal was accepted and not yet reaped
// or disposed. The map sits behind one mutex because different dispatch
// passes (and the disposal path) touch it at different times; every
// operation that must be atomic — notably the duplicate check on insert —
// happens under a single lock acquisition.

use std::collections::HashMap;
use std::sync::Mutex;

use acton_goal::{GoalId, ServerGoalHandle};
use acton_transport::ActionTypes;

use crate::error::ServerError;

/// A shared handle to one tracked goal of action type `A`.
pub type GoalHandle<A> =
    std::sync::Arc<ServerGoalHandle<<A as ActionTypes>::Goal, <A as ActionTypes>::Result>>;

/// Single source of truth mapping goal identity to goal handle.
pub struct GoalRegistry<A: ActionTypes> {
    goals: Mutex<HashMap<GoalId, GoalHandle<A>>>,
}

impl<A: ActionTypes> GoalRegistry<A> {
    pub fn new() -> Self {
        Self {
            goals: Mutex::new(HashMap::new()),
        }
    }

    /// Register a handle under its goal identity.
    ///
    /// The duplicate check and the insert happen under one lock: a duplicate
    /// identity fails with `ServerError::DuplicateGoal` and never overwrites
    /// the existing handle.
    pub fn insert(&self, handle: GoalHandle<A>) -> Result<(), ServerError> {
        let mut goals = self.lock();
        let goal_id = handle.goal_id();
        if goals.contains_key(&goal_id) {
            return Err(ServerError::DuplicateGoal(goal_id));
        }
        goals.insert(goal_id, handle);
        Ok(())
    }

    /// Look a goal up by identity. A miss is not an error; callers decide
    /// how to treat an untracked goal.
    pub fn lookup(&self, goal_id: GoalId) -> Option<GoalHandle<A>> {
        self.lock().get(&goal_id).cloned()
    }

    /// Point-in-time snapshot of every tracked handle.
    ///
    /// Callers iterate the returned vector, so concurrent completions can't
    /// mutate the set mid-iteration. Iteration order is unspecified.
    pub fn snapshot(&self) -> Vec<GoalHandle<A>> {
        self.lock().values().cloned().collect()
    }

    /// Remove a goal. Idempotent: removing an absent identity is a no-op.
    /// Returns whether a handle was actually removed.
    pub fn remove(&self, goal_id: GoalId) -> bool {
        self.lock().remove(&goal_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every handle. Used by disposal.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<GoalId, GoalHandle<A>>> {
        self.goals.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<A: ActionTypes> Default for GoalRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use acton_transport::{Fibonacci, FibonacciGoal};

    fn handle(order: u32) -> GoalHandle<Fibonacci> {
        Arc::new(ServerGoalHandle::new(
            GoalId::new(),
            FibonacciGoal { order },
        ))
    }

    #[test]
    fn insert_then_lookup_returns_same_handle() {
        let registry = GoalRegistry::<Fibonacci>::new();
        let h = handle(5);
        let id = h.goal_id();
        registry.insert(h.clone()).unwrap();

        let found = registry.lookup(id).unwrap();
        assert!(Arc::ptr_eq(&found, &h));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_insert_fails_without_overwriting() {
        let registry = GoalRegistry::<Fibonacci>::new();
        let first = handle(5);
        let id = first.goal_id();
        registry.insert(first.clone()).unwrap();

        let second = Arc::new(ServerGoalHandle::new(id, FibonacciGoal { order: 9 }));
        let err = registry.insert(second).unwrap_err();
        assert!(matches!(err, ServerError::DuplicateGoal(dup) if dup == id));

        // The original handle survives.
        let found = registry.lookup(id).unwrap();
        assert!(Arc::ptr_eq(&found, &first));
        assert_eq!(found.goal().order, 5);
    }

    #[test]
    fn lookup_miss_returns_none() {
        let registry = GoalRegistry::<Fibonacci>::new();
        assert!(registry.lookup(GoalId::new()).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = GoalRegistry::<Fibonacci>::new();
        let h = handle(5);
        let id = h.goal_id();
        registry.insert(h).unwrap();

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_point_in_time() {
        let registry = GoalRegistry::<Fibonacci>::new();
        let h = handle(5);
        let id = h.goal_id();
        registry.insert(h).unwrap();

        let snapshot = registry.snapshot();
        registry.remove(id);

        // The snapshot still holds the handle removed afterwards.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].goal_id(), id);
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let registry = GoalRegistry::<Fibonacci>::new();
        registry.insert(handle(1)).unwrap();
        registry.insert(handle(2)).unwrap();
        registry.clear();
        assert!(registry.is_empty());
    }
}
