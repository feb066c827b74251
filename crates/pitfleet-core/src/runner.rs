//! Simulation loop runner with operator controls.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the tick loop with support for:
//!
//! - **Bounded simulation**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: operator can halt and continue the whole run
//! - **Variable tick speed**: wall interval adjustable at runtime
//! - **Deferred commands**: queued fleet commands drain at the tick boundary
//! - **Operator stop**: wakes the interval sleep and exits cleanly
//!
//! [`SimulationHandle`] spawns the loop on the tokio runtime and hands the
//! final [`SimulationState`] back on stop. A handle spawned with
//! [`spawn_published`](SimulationHandle::spawn_published) also publishes the
//! final snapshot once the loop exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::controller::FleetController;
use crate::operator::{OperatorState, SimulationEndReason};
use crate::snapshot::build_snapshot;
use crate::tick::{SimulationState, TickError, TickSummary, run_tick};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// The spawned simulation task panicked or was cancelled.
    #[error("simulation task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed by this run.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
///
/// Implementations publish snapshots, forward tick summaries to observers,
/// and so on. The callback receives the tick summary and the state the
/// tick produced.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// Each iteration waits out a whole-run pause, ends the run on a stop
/// request or the wall-clock limit, drains the operator's command queue,
/// runs one tick, notifies `callback`, ends the run on the tick limit, and
/// then sleeps for the current tick interval. A stop request cuts the sleep
/// short.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    state: &mut SimulationState,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        vehicles = state.vehicles.len(),
        start_tick = state.clock.tick(),
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Simulation starting"
    );

    let end_reason = loop {
        if operator.is_paused() {
            info!(tick = state.clock.tick(), "Simulation paused");
            operator.wait_if_paused().await;
            info!(tick = state.clock.tick(), "Simulation resumed");
        }

        if let Some(reason) = pre_tick_end(operator) {
            break reason;
        }

        let commands = operator.drain_commands().await;
        let summary = run_tick(state, &commands)?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, state);

        let tick = summary.tick;
        last_summary = Some(summary);
        if operator.tick_limit_reached(tick) {
            info!(tick, max_ticks = operator.max_ticks(), "Tick limit reached");
            break SimulationEndReason::MaxTicksReached;
        }

        pace(operator).await;
    };

    operator.set_end_reason(end_reason);
    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
    })
}

/// Reasons to end the run checked before a tick starts.
fn pre_tick_end(operator: &OperatorState) -> Option<SimulationEndReason> {
    if operator.is_stop_requested() {
        info!("Operator stop requested");
        return Some(SimulationEndReason::OperatorStop);
    }
    if operator.time_limit_reached() {
        info!(
            max_seconds = operator.max_real_time_seconds(),
            elapsed = operator.elapsed_seconds(),
            "Real-time limit reached"
        );
        return Some(SimulationEndReason::MaxRealTimeReached);
    }
    None
}

/// Sleep one tick interval, or until a stop is requested.
async fn pace(operator: &OperatorState) {
    let interval_ms = operator.tick_interval_ms();
    if interval_ms == 0 {
        tokio::task::yield_now().await;
        return;
    }
    tokio::select! {
        () = tokio::time::sleep(Duration::from_millis(interval_ms)) => {}
        () = operator.stop_requested() => {}
    }
}

/// Log the simulation end sequence.
///
/// Called after [`run_simulation`] returns. The HTTP server keeps serving
/// the last snapshot after this.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            sim_time_s = summary.sim_time_s,
            transitions = summary.transitions.len(),
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

/// A simulation running on its own tokio task.
///
/// The task owns the [`SimulationState`] until [`stop`](Self::stop) joins
/// it and returns the state for inspection.
#[derive(Debug)]
pub struct SimulationHandle {
    operator: Arc<OperatorState>,
    task: JoinHandle<(SimulationState, Result<SimulationResult, RunnerError>)>,
}

impl SimulationHandle {
    /// Spawn the tick loop. Must be called from within a tokio runtime.
    pub fn spawn(
        state: SimulationState,
        operator: Arc<OperatorState>,
        callback: Box<dyn TickCallback + 'static>,
    ) -> Self {
        Self::spawn_inner(state, operator, callback, None)
    }

    /// Spawn the tick loop and publish the final snapshot through
    /// `controller` when it exits.
    ///
    /// Per-tick publication may skip a snapshot while readers hold the lock;
    /// the final one waits for them.
    pub fn spawn_published(
        state: SimulationState,
        controller: FleetController,
        callback: Box<dyn TickCallback + 'static>,
    ) -> Self {
        let operator = Arc::clone(controller.operator());
        Self::spawn_inner(state, operator, callback, Some(controller))
    }

    fn spawn_inner(
        mut state: SimulationState,
        operator: Arc<OperatorState>,
        mut callback: Box<dyn TickCallback + 'static>,
        controller: Option<FleetController>,
    ) -> Self {
        let task_operator = Arc::clone(&operator);
        let task = tokio::spawn(async move {
            let result = run_simulation(&mut state, &task_operator, callback.as_mut()).await;
            if let Some(controller) = controller {
                controller.publish_final(build_snapshot(&state)).await;
            }
            (state, result)
        });
        Self { operator, task }
    }

    /// The operator state shared with the running loop.
    pub const fn operator(&self) -> &Arc<OperatorState> {
        &self.operator
    }

    /// Whether the loop has exited on its own (a bound was reached).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request a stop, wait for the loop to exit, and return the final state.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Join`] if the task panicked, or the loop's own
    /// error if a tick failed.
    pub async fn stop(self) -> Result<(SimulationState, SimulationResult), RunnerError> {
        self.operator.request_stop();
        self.join().await
    }

    /// Wait for the loop to exit without requesting a stop.
    ///
    /// # Errors
    ///
    /// Same as [`stop`](Self::stop).
    pub async fn join(self) -> Result<(SimulationState, SimulationResult), RunnerError> {
        let (state, result) = self.task.await?;
        Ok((state, result?))
    }
}
