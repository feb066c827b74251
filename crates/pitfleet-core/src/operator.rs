//! Operator control state for runtime simulation management.
//!
//! This module provides shared state used by the tick loop and the
//! operator API. The operator can pause/resume the whole run, change tick
//! speed, queue fleet commands, and trigger a clean shutdown without
//! stopping the process.
//!
//! # Architecture
//!
//! Pause and stop live on a [`tokio::sync::watch`] channel, so any number of
//! tasks can wait on them and a stop wakes a paused loop. Fleet commands go
//! into a mutex-guarded queue that the tick loop drains at the start of each
//! tick; a command is never applied while a collaborator is reading state.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use pitfleet_types::FleetCommand;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use crate::config::SimulationBoundsConfig;

/// Shortest tick interval the operator may set, in milliseconds.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator issued a stop command.
    OperatorStop,
}

/// Whole-run control flags, published on a watch channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunControl {
    /// The run is paused between ticks.
    pub paused: bool,
    /// A stop was requested; it is never withdrawn.
    pub stop_requested: bool,
}

impl RunControl {
    /// Whether the tick loop may proceed (not paused, or stopping).
    pub const fn may_proceed(self) -> bool {
        !self.paused || self.stop_requested
    }
}

/// Shared operator control state.
///
/// Wrapped in [`std::sync::Arc`] and shared between the tick loop, the
/// fleet controller and the HTTP handlers.
#[derive(Debug)]
pub struct OperatorState {
    control: watch::Sender<RunControl>,
    tick_interval_ms: AtomicU64,
    bounds: SimulationBoundsConfig,
    started_at: DateTime<Utc>,
    started: Instant,
    commands: Mutex<Vec<FleetCommand>>,
    end_reason: OnceLock<SimulationEndReason>,
}

impl OperatorState {
    /// Create a new operator state from configuration.
    pub fn new(tick_interval_ms: u64, bounds: &SimulationBoundsConfig) -> Self {
        Self {
            control: watch::Sender::new(RunControl::default()),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            bounds: *bounds,
            started_at: Utc::now(),
            started: Instant::now(),
            commands: Mutex::new(Vec::new()),
            end_reason: OnceLock::new(),
        }
    }

    /// Current control flags.
    pub fn control(&self) -> RunControl {
        *self.control.borrow()
    }

    // -----------------------------------------------------------------------
    // Pause / resume / stop
    // -----------------------------------------------------------------------

    /// Whether the run is paused.
    pub fn is_paused(&self) -> bool {
        self.control().paused
    }

    /// Pause the run after the current tick.
    pub fn pause(&self) {
        self.control.send_if_modified(|c| !std::mem::replace(&mut c.paused, true));
    }

    /// Resume a paused run.
    pub fn resume(&self) {
        self.control.send_if_modified(|c| std::mem::replace(&mut c.paused, false));
    }

    /// Request a clean stop. Wakes a paused loop and its interval sleep.
    pub fn request_stop(&self) {
        self.control
            .send_if_modified(|c| !std::mem::replace(&mut c.stop_requested, true));
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.control().stop_requested
    }

    /// Wait until the run is resumed or a stop is requested.
    pub async fn wait_if_paused(&self) {
        let mut rx = self.control.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|c| c.may_proceed()).await;
    }

    /// Resolve once a stop is requested.
    pub async fn stop_requested(&self) {
        let mut rx = self.control.subscribe();
        let _ = rx.wait_for(|c| c.stop_requested).await;
    }

    /// Record why the run ended. The first reason recorded wins.
    pub fn set_end_reason(&self, reason: SimulationEndReason) {
        let _ = self.end_reason.set(reason);
    }

    /// Why the run ended, if it has.
    pub fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.get().copied()
    }

    // -----------------------------------------------------------------------
    // Tick speed
    // -----------------------------------------------------------------------

    /// Wall-clock milliseconds between ticks.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the wall-clock interval between ticks.
    ///
    /// Returns the previous interval, or `None` if `ms` is below
    /// [`MIN_TICK_INTERVAL_MS`]. Simulated seconds per tick are unaffected.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        (ms >= MIN_TICK_INTERVAL_MS).then(|| self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Bounds
    // -----------------------------------------------------------------------

    /// `true` once `current_tick` reaches a non-zero `max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.bounds.max_ticks > 0 && current_tick >= self.bounds.max_ticks
    }

    /// `true` once the run has been going for a non-zero `max_real_time_seconds`.
    pub fn time_limit_reached(&self) -> bool {
        let limit = self.bounds.max_real_time_seconds;
        limit > 0 && self.elapsed_seconds() >= limit
    }

    /// When the run started.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole wall-clock seconds since the run started.
    pub fn elapsed_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.bounds.max_ticks
    }

    /// Configured wall-clock limit in seconds (0 = unlimited).
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.bounds.max_real_time_seconds
    }

    // -----------------------------------------------------------------------
    // Fleet commands
    // -----------------------------------------------------------------------

    /// Queue a command for the next tick.
    pub async fn submit_command(&self, command: FleetCommand) {
        self.commands.lock().await.push(command);
    }

    /// Number of commands awaiting the next tick.
    pub async fn pending_commands(&self) -> usize {
        self.commands.lock().await.len()
    }

    /// Take every queued command, oldest first.
    pub async fn drain_commands(&self) -> Vec<FleetCommand> {
        std::mem::take(&mut *self.commands.lock().await)
    }
}

/// JSON-serializable status of the run for the operator API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Last completed tick.
    pub tick: u64,
    /// Whether the run is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Configured maximum ticks (0 = unlimited).
    pub max_ticks: u64,
    /// Configured maximum real-time seconds (0 = unlimited).
    pub max_real_time_seconds: u64,
    /// Vehicles in the fleet.
    pub vehicles_total: u32,
    /// Vehicles neither paused nor faulted.
    pub vehicles_active: u32,
    /// Commands waiting for the next tick.
    pub pending_commands: usize,
    /// The reason the run ended, if applicable.
    pub end_reason: Option<SimulationEndReason>,
    /// ISO 8601 timestamp of when the run started.
    pub started_at: String,
}
