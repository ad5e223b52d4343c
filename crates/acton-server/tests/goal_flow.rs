// goal_flow.rs — End-to-end lifecycle flows over the in-memory channel.
//
// A scripted client enqueues requests; the test plays the external
// scheduler, spinning is_ready()/execute() until the queues drain. This
// mirrors how a deployment drives the server: one pass per readiness poll.

use std::sync::{Arc, Mutex};

use acton_goal::{GoalId, GoalStatus};
use acton_server::{
    ActionServer, ActionServerOptions, CancelDecision, GoalDecision, GoalHandle,
};
use acton_transport::{
    CancelGoalRequest, CancelReturnCode, Fibonacci, FibonacciGoal, FibonacciResult,
    GetResultRequest, InMemoryChannel, SendGoalRequest,
};

type Channel = Arc<InMemoryChannel<Fibonacci>>;
type Server = ActionServer<Fibonacci, Channel>;
type Accepted = Arc<Mutex<Vec<GoalHandle<Fibonacci>>>>;

/// Server accepting goals of order <= 10, accepting every cancel, and
/// collecting accepted handles the way business logic would.
fn demo_server(channel: Channel) -> (Server, Accepted) {
    let accepted: Accepted = Arc::new(Mutex::new(Vec::new()));
    let sink = accepted.clone();
    let server = ActionServer::new(
        ActionServerOptions::new("fibonacci"),
        channel,
        |request: &SendGoalRequest<FibonacciGoal>| {
            if request.goal.order <= 10 {
                GoalDecision::Accept
            } else {
                GoalDecision::Reject
            }
        },
        |_handle| CancelDecision::Accept,
        move |handle| sink.lock().unwrap().push(handle),
    )
    .unwrap();
    (server, accepted)
}

/// Spin dispatch passes until a poll reports nothing ready.
fn spin(server: &mut Server) {
    while server.is_ready().unwrap() {
        server.execute().unwrap();
    }
}

fn fibonacci(order: u32) -> Vec<u64> {
    let mut sequence = Vec::with_capacity(order as usize);
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 0..order {
        sequence.push(a);
        let next = a + b;
        a = b;
        b = next;
    }
    sequence
}

#[test]
fn submit_accept_cancel_flow() {
    let channel: Channel = Arc::new(InMemoryChannel::new());
    let (mut server, accepted) = demo_server(channel.clone());

    // Submit G1; the policy accepts.
    let g1 = GoalId::new();
    channel.submit_goal(SendGoalRequest {
        goal_id: g1,
        goal: FibonacciGoal { order: 8 },
    });
    spin(&mut server);

    let (_, response) = channel.pop_goal_response().unwrap();
    assert!(response.accepted);
    assert_eq!(server.registry().len(), 1);

    // The notification fired with a handle whose payload matches the
    // submitted goal.
    {
        let accepted = accepted.lock().unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].goal_id(), g1);
        assert_eq!(accepted[0].goal().order, 8);
        assert_eq!(accepted[0].status(), GoalStatus::Accepted);
    }

    // Cancel-all: the response names G1 and the goal reads canceling.
    channel.submit_cancel(CancelGoalRequest::all());
    spin(&mut server);

    let (_, cancel_response) = channel.pop_cancel_response().unwrap();
    assert_eq!(cancel_response.return_code, CancelReturnCode::None);
    assert_eq!(cancel_response.goals_canceling.len(), 1);
    assert_eq!(cancel_response.goals_canceling[0].goal_id, g1);
    assert_eq!(
        server.registry().lookup(g1).unwrap().status(),
        GoalStatus::Canceling
    );
}

#[test]
fn rejected_goal_never_registers_or_notifies() {
    let channel: Channel = Arc::new(InMemoryChannel::new());
    let (mut server, accepted) = demo_server(channel.clone());

    let g2 = GoalId::new();
    channel.submit_goal(SendGoalRequest {
        goal_id: g2,
        goal: FibonacciGoal { order: 99 },
    });
    spin(&mut server);

    let (_, response) = channel.pop_goal_response().unwrap();
    assert!(!response.accepted);
    assert_eq!(server.registry().len(), 0);
    assert!(accepted.lock().unwrap().is_empty());
}

#[test]
fn full_lifecycle_execute_succeed_and_fetch_result() {
    let channel: Channel = Arc::new(InMemoryChannel::new());
    let (mut server, accepted) = demo_server(channel.clone());

    let goal_id = GoalId::new();
    channel.submit_goal(SendGoalRequest {
        goal_id,
        goal: FibonacciGoal { order: 6 },
    });
    spin(&mut server);
    channel.pop_goal_response().unwrap();

    // Business logic runs the goal to completion.
    let handle = accepted.lock().unwrap().pop().unwrap();
    handle.execute().unwrap();
    handle
        .succeed(FibonacciResult {
            sequence: fibonacci(handle.goal().order),
        })
        .unwrap();

    // A result request reports the terminal status and the stored result.
    channel.submit_result_request(GetResultRequest { goal_id });
    spin(&mut server);

    let (_, result) = channel.pop_result_response().unwrap();
    assert_eq!(result.status, GoalStatus::Succeeded);
    assert_eq!(
        result.result.unwrap().sequence,
        vec![1, 1, 2, 3, 5, 8]
    );
}

#[test]
fn canceled_goal_honors_cancel_and_reports_canceled() {
    let channel: Channel = Arc::new(InMemoryChannel::new());
    let (mut server, accepted) = demo_server(channel.clone());

    let goal_id = GoalId::new();
    channel.submit_goal(SendGoalRequest {
        goal_id,
        goal: FibonacciGoal { order: 9 },
    });
    spin(&mut server);
    channel.pop_goal_response().unwrap();

    let handle = accepted.lock().unwrap().pop().unwrap();
    handle.execute().unwrap();

    channel.submit_cancel(CancelGoalRequest::single(goal_id));
    spin(&mut server);
    let (_, cancel_response) = channel.pop_cancel_response().unwrap();
    assert_eq!(cancel_response.goals_canceling.len(), 1);

    // The business logic notices and winds down with a partial result.
    assert!(handle.is_canceling());
    handle
        .canceled(FibonacciResult {
            sequence: vec![1, 1, 2],
        })
        .unwrap();

    channel.submit_result_request(GetResultRequest { goal_id });
    spin(&mut server);
    let (_, result) = channel.pop_result_response().unwrap();
    assert_eq!(result.status, GoalStatus::Canceled);
    assert_eq!(result.result.unwrap().sequence, vec![1, 1, 2]);
}

#[test]
fn one_item_drained_per_ready_pass() {
    let channel: Channel = Arc::new(InMemoryChannel::new());
    let (mut server, _accepted) = demo_server(channel.clone());

    for _ in 0..3 {
        channel.submit_goal(SendGoalRequest {
            goal_id: GoalId::new(),
            goal: FibonacciGoal { order: 2 },
        });
    }

    // One pass takes exactly one submission.
    assert!(server.is_ready().unwrap());
    server.execute().unwrap();
    assert_eq!(server.registry().len(), 1);

    // Repeated invocation drains the rest.
    spin(&mut server);
    assert_eq!(server.registry().len(), 3);
}

#[test]
fn mixed_pass_handles_each_channel_independently() {
    let channel: Channel = Arc::new(InMemoryChannel::new());
    let (mut server, _accepted) = demo_server(channel.clone());

    // Register one goal first.
    let existing = GoalId::new();
    channel.submit_goal(SendGoalRequest {
        goal_id: existing,
        goal: FibonacciGoal { order: 4 },
    });
    spin(&mut server);
    channel.pop_goal_response().unwrap();

    // Now queue one item on every channel; a single pass serves all three.
    let incoming = GoalId::new();
    channel.submit_goal(SendGoalRequest {
        goal_id: incoming,
        goal: FibonacciGoal { order: 5 },
    });
    channel.submit_cancel(CancelGoalRequest::single(existing));
    channel.submit_result_request(GetResultRequest { goal_id: existing });

    assert!(server.is_ready().unwrap());
    server.execute().unwrap();

    assert!(channel.pop_goal_response().unwrap().1.accepted);
    let (_, cancel_response) = channel.pop_cancel_response().unwrap();
    assert_eq!(cancel_response.goals_canceling.len(), 1);
    // Fixed dispatch order: the cancel ran before the result request, so
    // the result response already reads canceling.
    let (_, result_response) = channel.pop_result_response().unwrap();
    assert_eq!(result_response.status, GoalStatus::Canceling);
    assert_eq!(server.registry().len(), 2);
}
