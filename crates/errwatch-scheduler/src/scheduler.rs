//! The poll-and-notify scheduler.
//!
//! Owns one ticking loop task per check kind, all on the same interval.
//! A tick spawns a check invocation with its own fixed deadline,
//! independent of the interval; a tick that fires while the previous
//! invocation of the same kind is still running is skipped, so at most
//! one invocation per kind is in flight. Kinds never block each other.
//!
//! Shutdown contract: on the shutdown signal the tickers stop, no new
//! invocations launch, and `run` returns only once every in-flight
//! invocation has completed (bounded by each invocation's own deadline).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use errwatch_core::CheckDefinition;
use errwatch_notify::OutboundMessage;

use crate::error::CheckError;
use crate::routine::CheckRunner;

/// Scheduler lifecycle. Transitions run one way:
/// `Idle -> Running -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

pub struct Scheduler {
    runner: Arc<CheckRunner>,
    checks: Vec<CheckDefinition>,
    /// Tick interval shared by every check kind. Precondition: > 0,
    /// enforced by config validation before the scheduler exists.
    interval: Duration,
    /// Deadline applied to each spawned invocation.
    invocation_timeout: Duration,
    state_tx: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(
        runner: Arc<CheckRunner>,
        checks: Vec<CheckDefinition>,
        interval: Duration,
        invocation_timeout: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(SchedulerState::Idle);
        Self {
            runner,
            checks,
            interval,
            invocation_timeout,
            state_tx,
        }
    }

    /// Observe lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    /// Run until `shutdown` is signalled and all in-flight invocations
    /// have drained.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        // Best-effort startup announcement; delivery failure is not fatal.
        let announce = OutboundMessage::text(format!(
            "errwatch is running with {}s interval",
            self.interval.as_secs()
        ));
        if let Err(e) = self.runner.notifier().notify(&announce).await {
            warn!(error = %e, "startup notification failed");
        }

        self.state_tx.send_replace(SchedulerState::Running);
        info!(
            interval_secs = self.interval.as_secs(),
            checks = self.checks.len(),
            "scheduler started"
        );

        let mut loops = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            loops.push(tokio::spawn(tick_loop(
                self.runner.clone(),
                *check,
                self.interval,
                self.invocation_timeout,
                shutdown.clone(),
            )));
        }

        // Wait for the shutdown signal.
        let mut shutdown = shutdown;
        if !*shutdown.borrow() {
            let _ = shutdown.changed().await;
        }

        self.state_tx.send_replace(SchedulerState::Draining);
        info!("scheduler draining in-flight invocations");
        for handle in loops {
            let _ = handle.await;
        }

        self.state_tx.send_replace(SchedulerState::Stopped);
        info!("scheduler stopped");
    }
}

/// The ticking loop for one check kind.
async fn tick_loop(
    runner: Arc<CheckRunner>,
    check: CheckDefinition,
    interval: Duration,
    invocation_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first interval tick completes immediately; swallow it so the
    // first check fires one full interval after startup.
    ticker.tick().await;

    let mut in_flight: Option<JoinHandle<Result<(), CheckError>>> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if *shutdown.borrow() {
                    break;
                }
                // Overlap guard: at most one invocation per kind.
                if let Some(handle) = &in_flight {
                    if !handle.is_finished() {
                        debug!(check = check.name, "previous invocation still running, tick skipped");
                        continue;
                    }
                }
                let runner = runner.clone();
                let invocation_shutdown = shutdown.clone();
                in_flight = Some(tokio::spawn(async move {
                    let deadline = Instant::now() + invocation_timeout;
                    let result = runner
                        .run_check(&check, deadline, &invocation_shutdown)
                        .await;
                    if let Err(e) = &result {
                        error!(check = check.name, error = %e, "check invocation failed");
                    }
                    result
                }));
            }
            _ = shutdown.changed() => {
                break;
            }
        }
    }

    // Drain: never abandon an in-flight invocation.
    if let Some(handle) = in_flight.take() {
        let _ = handle.await;
    }
    debug!(check = check.name, "tick loop stopped");
}
