// channel.rs — Readiness signaling and the take/send channel contract.
//
// The wait-set poll lives outside this engine. Whatever transport sits
// underneath, the engine only needs two things from it: a readiness snapshot
// (four independent flags, one per channel) and non-blocking take/send pairs
// whose correlation ids round-trip unchanged between the take and the send
// answering it.

use thiserror::Error;

use crate::action::{
    ActionTypes, CancelGoalRequest, CancelGoalResponse, GetResultRequest, GetResultResponse,
    SendGoalRequest, SendGoalResponse,
};

/// Opaque token pairing a request with its eventual response.
///
/// The engine never inspects the value; it hands back on send exactly what
/// it received on take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub u64);

/// Per-channel readiness flags, refreshed once per poll.
///
/// Named fields instead of a positional boolean array: the flags are
/// independent and an indexing slip between them would silently route
/// requests to the wrong handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    /// A goal submission is pending.
    pub goal_request: bool,
    /// A cancel request is pending.
    pub cancel_request: bool,
    /// A result request is pending.
    pub result_request: bool,
    /// The goal-expiry timer fired.
    pub goal_expired: bool,
}

impl Readiness {
    /// Whether any channel has work.
    pub fn any(&self) -> bool {
        self.goal_request || self.cancel_request || self.result_request || self.goal_expired
    }
}

/// Errors surfaced by a transport implementation.
///
/// Note what is *not* here: a take that finds nothing after a positive
/// readiness signal returns `Ok(None)` — a benign race with another
/// consumer, not an error.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The channel was torn down underneath the server.
    #[error("channel closed")]
    ChannelClosed,

    /// A message failed to encode or decode at the wire boundary.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-specific failure.
    #[error("transport error: {0}")]
    Other(String),
}

/// Non-blocking take/send primitives for one action's three request channels.
///
/// Every take returns `Ok(None)` when the queue is empty; readiness is only
/// a hint that a take is worth attempting. Sends answer a previously taken
/// request and must be passed the same correlation id.
pub trait ActionChannel<A: ActionTypes>: Send + Sync {
    /// Snapshot the four readiness flags.
    fn readiness(&self) -> Readiness;

    fn take_goal_request(
        &self,
    ) -> Result<Option<(CorrelationId, SendGoalRequest<A::Goal>)>, TransportError>;

    fn send_goal_response(
        &self,
        correlation: CorrelationId,
        response: SendGoalResponse,
    ) -> Result<(), TransportError>;

    fn take_cancel_request(
        &self,
    ) -> Result<Option<(CorrelationId, CancelGoalRequest)>, TransportError>;

    fn send_cancel_response(
        &self,
        correlation: CorrelationId,
        response: CancelGoalResponse,
    ) -> Result<(), TransportError>;

    fn take_result_request(
        &self,
    ) -> Result<Option<(CorrelationId, GetResultRequest)>, TransportError>;

    fn send_result_response(
        &self,
        correlation: CorrelationId,
        response: GetResultResponse<A::Result>,
    ) -> Result<(), TransportError>;
}

// A shared channel is still a channel; the server can own an Arc clone while
// the test or client side keeps another.
impl<A: ActionTypes, T: ActionChannel<A>> ActionChannel<A> for std::sync::Arc<T> {
    fn readiness(&self) -> Readiness {
        (**self).readiness()
    }

    fn take_goal_request(
        &self,
    ) -> Result<Option<(CorrelationId, SendGoalRequest<A::Goal>)>, TransportError> {
        (**self).take_goal_request()
    }

    fn send_goal_response(
        &self,
        correlation: CorrelationId,
        response: SendGoalResponse,
    ) -> Result<(), TransportError> {
        (**self).send_goal_response(correlation, response)
    }

    fn take_cancel_request(
        &self,
    ) -> Result<Option<(CorrelationId, CancelGoalRequest)>, TransportError> {
        (**self).take_cancel_request()
    }

    fn send_cancel_response(
        &self,
        correlation: CorrelationId,
        response: CancelGoalResponse,
    ) -> Result<(), TransportError> {
        (**self).send_cancel_response(correlation, response)
    }

    fn take_result_request(
        &self,
    ) -> Result<Option<(CorrelationId, GetResultRequest)>, TransportError> {
        (**self).take_result_request()
    }

    fn send_result_response(
        &self,
        correlation: CorrelationId,
        response: GetResultResponse<A::Result>,
    ) -> Result<(), TransportError> {
        (**self).send_result_response(correlation, response)
    }
}
