//! # acton-transport
//!
//! The contracts an Acton action server consumes from its transport layer,
//! plus an in-process implementation for tests and demos.
//!
//! The lifecycle engine never blocks on I/O: an external wait-set poll
//! establishes readiness first, and every take is non-blocking. This crate
//! defines that boundary:
//!
//! - [`ActionTypes`] — compile-time association of an action's goal and
//!   result message types
//! - [`Readiness`] — the four per-channel readiness flags, with named fields
//! - [`CorrelationId`] — opaque token pairing a request with its response
//! - [`ActionChannel`] — non-blocking take/send primitives for the goal,
//!   cancel, and result channels
//! - [`InMemoryChannel`] — queue-backed channel for wiring a server and a
//!   scripted client together in one process

pub mod action;
pub mod channel;
pub mod memory;

pub use action::{
    ActionTypes, CancelGoalRequest, CancelGoalResponse, CancelReturnCode, GetResultRequest,
    GetResultResponse, SendGoalRequest, SendGoalResponse,
};
pub use channel::{ActionChannel, CorrelationId, Readiness, TransportError};
pub use memory::{Fibonacci, FibonacciGoal, FibonacciResult, InMemoryChannel};
