// memory.rs — In-process channel for tests and demos.
//
// Wires a scripted client and an action server together through plain
// queues: the client side enqueues requests and collects responses; the
// server side sees the ActionChannel trait and nothing else. Readiness is
// derived from queue occupancy, except the expiry flag, which behaves like
// a one-shot timer armed by the test/demo driver.
//
// The channel can also be told to simulate the two transport races the
// engine must tolerate: a take that misses after a positive readiness
// signal, and a closed channel.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::action::{
    ActionTypes, CancelGoalRequest, CancelGoalResponse, GetResultRequest, GetResultResponse,
    SendGoalRequest, SendGoalResponse,
};
use crate::channel::{ActionChannel, CorrelationId, Readiness, TransportError};

/// The demo action: compute a Fibonacci sequence of a requested order.
///
/// Small enough to script, long-running enough in spirit to make
/// cancellation meaningful.
pub struct Fibonacci;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FibonacciGoal {
    /// How many elements of the sequence to produce.
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FibonacciResult {
    pub sequence: Vec<u64>,
}

impl ActionTypes for Fibonacci {
    type Goal = FibonacciGoal;
    type Result = FibonacciResult;
}

struct Queues<A: ActionTypes> {
    goal_requests: VecDeque<(CorrelationId, SendGoalRequest<A::Goal>)>,
    cancel_requests: VecDeque<(CorrelationId, CancelGoalRequest)>,
    result_requests: VecDeque<(CorrelationId, GetResultRequest)>,
    goal_responses: VecDeque<(CorrelationId, SendGoalResponse)>,
    cancel_responses: VecDeque<(CorrelationId, CancelGoalResponse)>,
    result_responses: VecDeque<(CorrelationId, GetResultResponse<A::Result>)>,
}

impl<A: ActionTypes> Default for Queues<A> {
    fn default() -> Self {
        Self {
            goal_requests: VecDeque::new(),
            cancel_requests: VecDeque::new(),
            result_requests: VecDeque::new(),
            goal_responses: VecDeque::new(),
            cancel_responses: VecDeque::new(),
            result_responses: VecDeque::new(),
        }
    }
}

/// Queue-backed [`ActionChannel`] implementation.
///
/// Shared between the client and server sides behind an `Arc`.
pub struct InMemoryChannel<A: ActionTypes> {
    queues: Mutex<Queues<A>>,
    next_correlation: AtomicU64,
    expiry_armed: AtomicBool,
    drop_next_goal_take: AtomicBool,
    closed: AtomicBool,
}

impl<A: ActionTypes> InMemoryChannel<A> {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(Queues::default()),
            next_correlation: AtomicU64::new(1),
            expiry_armed: AtomicBool::new(false),
            drop_next_goal_take: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    // ---- client side ----

    /// Enqueue a goal submission; returns the correlation id the response
    /// will carry.
    pub fn submit_goal(&self, request: SendGoalRequest<A::Goal>) -> CorrelationId {
        let correlation = self.fresh_correlation();
        self.queues().goal_requests.push_back((correlation, request));
        correlation
    }

    /// Enqueue a cancel request.
    pub fn submit_cancel(&self, request: CancelGoalRequest) -> CorrelationId {
        let correlation = self.fresh_correlation();
        self.queues()
            .cancel_requests
            .push_back((correlation, request));
        correlation
    }

    /// Enqueue a result request.
    pub fn submit_result_request(&self, request: GetResultRequest) -> CorrelationId {
        let correlation = self.fresh_correlation();
        self.queues()
            .result_requests
            .push_back((correlation, request));
        correlation
    }

    /// Pop the oldest goal response, if the server has sent one.
    pub fn pop_goal_response(&self) -> Option<(CorrelationId, SendGoalResponse)> {
        self.queues().goal_responses.pop_front()
    }

    /// Pop the oldest cancel response, if the server has sent one.
    pub fn pop_cancel_response(&self) -> Option<(CorrelationId, CancelGoalResponse)> {
        self.queues().cancel_responses.pop_front()
    }

    /// Pop the oldest result response, if the server has sent one.
    pub fn pop_result_response(&self) -> Option<(CorrelationId, GetResultResponse<A::Result>)> {
        self.queues().result_responses.pop_front()
    }

    // ---- test hooks ----

    /// Arm the expiry flag; the next readiness snapshot reports it once.
    pub fn arm_expiry_timer(&self) {
        self.expiry_armed.store(true, Ordering::SeqCst);
    }

    /// Make the next goal-request take miss even though readiness reported
    /// a pending item (the benign take/readiness race).
    pub fn force_goal_take_miss(&self) {
        self.drop_next_goal_take.store(true, Ordering::SeqCst);
    }

    /// Tear the channel down; every subsequent take or send fails.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn fresh_correlation(&self) -> CorrelationId {
        CorrelationId(self.next_correlation.fetch_add(1, Ordering::SeqCst))
    }

    fn queues(&self) -> std::sync::MutexGuard<'_, Queues<A>> {
        self.queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed);
        }
        Ok(())
    }
}

impl<A: ActionTypes> Default for InMemoryChannel<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ActionTypes> ActionChannel<A> for InMemoryChannel<A> {
    fn readiness(&self) -> Readiness {
        let queues = self.queues();
        Readiness {
            goal_request: !queues.goal_requests.is_empty()
                || self.drop_next_goal_take.load(Ordering::SeqCst),
            cancel_request: !queues.cancel_requests.is_empty(),
            result_request: !queues.result_requests.is_empty(),
            // One-shot: report the armed timer once, like a timer firing.
            goal_expired: self.expiry_armed.swap(false, Ordering::SeqCst),
        }
    }

    fn take_goal_request(
        &self,
    ) -> Result<Option<(CorrelationId, SendGoalRequest<A::Goal>)>, TransportError> {
        self.ensure_open()?;
        if self.drop_next_goal_take.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.queues().goal_requests.pop_front())
    }

    fn send_goal_response(
        &self,
        correlation: CorrelationId,
        response: SendGoalResponse,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.queues().goal_responses.push_back((correlation, response));
        Ok(())
    }

    fn take_cancel_request(
        &self,
    ) -> Result<Option<(CorrelationId, CancelGoalRequest)>, TransportError> {
        self.ensure_open()?;
        Ok(self.queues().cancel_requests.pop_front())
    }

    fn send_cancel_response(
        &self,
        correlation: CorrelationId,
        response: CancelGoalResponse,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.queues()
            .cancel_responses
            .push_back((correlation, response));
        Ok(())
    }

    fn take_result_request(
        &self,
    ) -> Result<Option<(CorrelationId, GetResultRequest)>, TransportError> {
        self.ensure_open()?;
        Ok(self.queues().result_requests.pop_front())
    }

    fn send_result_response(
        &self,
        correlation: CorrelationId,
        response: GetResultResponse<A::Result>,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.queues()
            .result_responses
            .push_back((correlation, response));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acton_goal::GoalId;

    fn channel() -> InMemoryChannel<Fibonacci> {
        InMemoryChannel::new()
    }

    #[test]
    fn readiness_tracks_queue_occupancy() {
        let ch = channel();
        assert!(!ch.readiness().any());

        ch.submit_goal(SendGoalRequest {
            goal_id: GoalId::new(),
            goal: FibonacciGoal { order: 5 },
        });
        let ready = ch.readiness();
        assert!(ready.goal_request);
        assert!(!ready.cancel_request);
        assert!(!ready.result_request);
    }

    #[test]
    fn correlation_id_round_trips_take_to_send() {
        let ch = channel();
        let submitted = ch.submit_goal(SendGoalRequest {
            goal_id: GoalId::new(),
            goal: FibonacciGoal { order: 3 },
        });

        let (taken, _request) =
            ActionChannel::<Fibonacci>::take_goal_request(&ch).unwrap().unwrap();
        assert_eq!(taken, submitted);

        ch.send_goal_response(
            taken,
            SendGoalResponse {
                accepted: true,
                stamp: chrono::Utc::now(),
            },
        )
        .unwrap();
        let (answered, response) = ch.pop_goal_response().unwrap();
        assert_eq!(answered, submitted);
        assert!(response.accepted);
    }

    #[test]
    fn forced_take_miss_reports_ready_then_takes_nothing() {
        let ch = channel();
        ch.force_goal_take_miss();
        assert!(ch.readiness().goal_request);
        assert!(ActionChannel::<Fibonacci>::take_goal_request(&ch)
            .unwrap()
            .is_none());
        // The miss is consumed; readiness settles back to idle.
        assert!(!ch.readiness().any());
    }

    #[test]
    fn expiry_timer_is_one_shot() {
        let ch = channel();
        ch.arm_expiry_timer();
        assert!(ch.readiness().goal_expired);
        assert!(!ch.readiness().goal_expired);
    }

    #[test]
    fn closed_channel_fails_takes_and_sends() {
        let ch = channel();
        ch.close();
        assert!(matches!(
            ActionChannel::<Fibonacci>::take_goal_request(&ch),
            Err(TransportError::ChannelClosed)
        ));
        assert!(matches!(
            ch.send_cancel_response(
                CorrelationId(1),
                CancelGoalResponse {
                    return_code: crate::action::CancelReturnCode::None,
                    goals_canceling: Vec::new(),
                },
            ),
            Err(TransportError::ChannelClosed)
        ));
    }

    #[test]
    fn takes_drain_in_fifo_order() {
        let ch = channel();
        let first = ch.submit_cancel(CancelGoalRequest::all());
        let second = ch.submit_cancel(CancelGoalRequest::all());

        let (taken_first, _) = ActionChannel::<Fibonacci>::take_cancel_request(&ch)
            .unwrap()
            .unwrap();
        let (taken_second, _) = ActionChannel::<Fibonacci>::take_cancel_request(&ch)
            .unwrap()
            .unwrap();
        assert_eq!(taken_first, first);
        assert_eq!(taken_second, second);
        assert!(ActionChannel::<Fibonacci>::take_cancel_request(&ch)
            .unwrap()
            .is_none());
    }
}
