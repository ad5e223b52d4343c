// goal_id.rs — GoalId: client-supplied goal identity.
//
// The client picks the UUID at submission time and the server uses it as the
// registry key. Identity comparison is exact byte equality — two goals are
// the same goal iff their UUIDs match. The nil (all-zero) UUID is reserved
// by the cancel protocol to mean "match every active goal".

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one goal, supplied by the client at submission time.
///
/// Wraps a UUID so the registry key type can't be confused with the other
/// UUIDs floating around a deployment (node ids, correlation tokens, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(Uuid);

impl GoalId {
    /// Generate a fresh random identity (what a well-behaved client does).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero identity — the cancel protocol's "match all" filter.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the all-zero identity.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// The raw 16 identity bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for GoalId {
    /// Defaults to nil, matching a zeroed wire message.
    fn default() -> Self {
        Self::nil()
    }
}

impl From<Uuid> for GoalId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A goal's identity paired with its acceptance stamp.
///
/// This is what cancel responses carry: enough for the client to correlate
/// which of its goals are now canceling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalInfo {
    pub goal_id: GoalId,
    pub stamp: DateTime<Utc>,
}
