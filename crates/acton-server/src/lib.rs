//! # acton-server
//!
//! The goal-lifecycle engine behind an Acton action server: the part that
//! decides whether to accept each goal, tracks accepted goals in a registry,
//! negotiates cancellation, answers result requests, and reaps expired
//! terminal goals.
//!
//! The engine is transport-agnostic and never blocks: an external scheduler
//! polls readiness, then calls [`ActionServer::is_ready`] and
//! [`ActionServer::execute`] to run one dispatch pass. User-supplied policy
//! callbacks decide goal admission and cancellation; the engine guarantees
//! the bookkeeping around them (at-most-one registration per goal identity,
//! notification only after registration, and correct reconciliation of
//! cancels against goals racing to completion).
//!
//! ## Key components
//!
//! - [`ActionServer`] — the readiness-driven dispatch loop
//! - [`GoalRegistry`] — the authoritative goal-id → handle map
//! - [`GoalDecision`] / [`CancelDecision`] — the policy callback verdicts
//! - [`ActionServerOptions`] — configuration (action name, result timeout)

pub mod accept;
pub mod cancel;
pub mod error;
pub mod options;
pub mod registry;
pub mod server;

pub use error::ServerError;
pub use options::{ActionServerOptions, DEFAULT_RESULT_TIMEOUT};
pub use registry::{GoalHandle, GoalRegistry};
pub use server::{ActionServer, CancelDecision, GoalDecision};
