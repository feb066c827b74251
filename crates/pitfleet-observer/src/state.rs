//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for tick summaries and the
//! [`FleetController`] that serves snapshots and accepts commands.

use pitfleet_core::controller::FleetController;
use pitfleet_core::tick::TickSummary;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for tick summaries.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// JSON-serializable tick summary pushed over the `WebSocket`.
///
/// A lightweight projection of the core [`TickSummary`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TickBroadcast {
    /// The tick number.
    pub tick: u64,
    /// Simulated seconds elapsed.
    pub sim_time_s: f64,
    /// Phase changes committed this tick.
    pub phase_changes: usize,
    /// Commands applied at the start of this tick.
    pub commands_applied: usize,
    /// Tonnes tipped this tick.
    pub tons_dumped: f64,
}

impl From<&TickSummary> for TickBroadcast {
    fn from(summary: &TickSummary) -> Self {
        Self {
            tick: summary.tick,
            sim_time_s: summary.sim_time_s,
            phase_changes: summary.transitions.len(),
            commands_applied: summary.commands_applied,
            tons_dumped: summary.tons_dumped,
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`std::sync::Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broadcast sender for tick summary messages.
    pub tx: broadcast::Sender<TickBroadcast>,
    /// Snapshot reads and command submission.
    pub controller: FleetController,
}

impl AppState {
    /// Create a new application state around a controller.
    pub fn new(controller: FleetController) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx, controller }
    }

    /// Subscribe to the tick broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<TickBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a tick summary to all connected clients.
    ///
    /// Returns the number of receivers that received the message, 0 when
    /// no clients are connected.
    pub fn broadcast(&self, summary: &TickBroadcast) -> usize {
        self.tx.send(summary.clone()).unwrap_or(0)
    }
}
