//! # acton-daemon
//!
//! Demo driver for the Acton action server engine.
//!
//! Plays both sides of a Fibonacci action over the in-memory channel: a
//! scripted client submits goals (and optionally a cancel-all), while the
//! driver acts as the external scheduler, polling readiness and running
//! dispatch passes until the queues drain. Accepted goals are executed
//! inline and their results fetched back through the result channel.
//!
//! ## Usage
//!
//! ```text
//! acton-daemon --goals 3 --order 8
//! acton-daemon --goals 3 --order 8 --cancel
//! ```

use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use acton_goal::GoalId;
use acton_server::{ActionServer, ActionServerOptions, CancelDecision, GoalDecision, GoalHandle};
use acton_transport::{
    CancelGoalRequest, Fibonacci, FibonacciGoal, FibonacciResult, GetResultRequest,
    InMemoryChannel, SendGoalRequest,
};

/// The largest order the demo goal policy will accept.
const MAX_ORDER: u32 = 30;

/// Acton demo action server.
#[derive(Parser)]
#[command(name = "acton-daemon", about = "Acton action server demo driver")]
struct Cli {
    /// How many goals the scripted client submits.
    #[arg(long, default_value_t = 3)]
    goals: u32,

    /// Fibonacci order for the first goal; each further goal adds one.
    #[arg(long, default_value_t = 8)]
    order: u32,

    /// Submit a cancel-all request before executing the goals.
    #[arg(long)]
    cancel: bool,
}

type Channel = Arc<InMemoryChannel<Fibonacci>>;
type Server = ActionServer<Fibonacci, Channel>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("acton_server=debug".parse()?)
                .add_directive("acton_daemon=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let channel: Channel = Arc::new(InMemoryChannel::new());
    let accepted: Arc<Mutex<Vec<GoalHandle<Fibonacci>>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = accepted.clone();
    let mut server: Server = ActionServer::new(
        ActionServerOptions::new("fibonacci"),
        channel.clone(),
        |request: &SendGoalRequest<FibonacciGoal>| {
            if request.goal.order <= MAX_ORDER {
                GoalDecision::Accept
            } else {
                GoalDecision::Reject
            }
        },
        |_handle| CancelDecision::Accept,
        move |handle| sink.lock().unwrap().push(handle),
    )?;

    tracing::info!(action = server.action_name(), "action server ready");

    // Scripted client: submit the goals.
    let mut goal_ids = Vec::new();
    for i in 0..cli.goals {
        let goal_id = GoalId::new();
        goal_ids.push(goal_id);
        channel.submit_goal(SendGoalRequest {
            goal_id,
            goal: FibonacciGoal {
                order: cli.order + i,
            },
        });
    }
    if cli.cancel {
        channel.submit_cancel(CancelGoalRequest::all());
    }

    spin(&mut server)?;

    while let Some((_, response)) = channel.pop_goal_response() {
        tracing::info!(accepted = response.accepted, "goal response");
    }
    while let Some((_, response)) = channel.pop_cancel_response() {
        tracing::info!(
            return_code = ?response.return_code,
            canceling = response.goals_canceling.len(),
            "cancel response"
        );
    }

    // Business logic: run each accepted goal, honoring pending cancels.
    for handle in accepted.lock().unwrap().drain(..) {
        if handle.is_canceling() {
            handle.canceled(FibonacciResult { sequence: vec![] })?;
            tracing::info!(goal_id = %handle.goal_id(), "goal canceled before execution");
            continue;
        }
        handle.execute()?;
        let result = FibonacciResult {
            sequence: fibonacci(handle.goal().order),
        };
        handle.succeed(result)?;
        tracing::info!(goal_id = %handle.goal_id(), "goal succeeded");
    }

    // Fetch every result back through the result channel.
    for goal_id in goal_ids {
        channel.submit_result_request(GetResultRequest { goal_id });
    }
    spin(&mut server)?;

    while let Some((_, response)) = channel.pop_result_response() {
        tracing::info!(
            status = %response.status,
            sequence = ?response.result.map(|r| r.sequence),
            "result response"
        );
    }

    server.dispose();
    tracing::info!("action server disposed");
    Ok(())
}

/// Drive dispatch passes until a readiness poll comes back idle.
fn spin(server: &mut Server) -> Result<()> {
    while server.is_ready()? {
        server.execute()?;
    }
    Ok(())
}

fn fibonacci(order: u32) -> Vec<u64> {
    let mut sequence = Vec::with_capacity(order as usize);
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 0..order {
        sequence.push(a);
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    sequence
}
