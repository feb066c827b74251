//! Tick callback that feeds the Observer API.
//!
//! After each tick this callback publishes a fresh fleet snapshot through
//! the controller and broadcasts a [`TickBroadcast`] to connected
//! `WebSocket` clients.

use std::sync::Arc;

use pitfleet_core::runner::TickCallback;
use pitfleet_core::snapshot::build_snapshot;
use pitfleet_core::tick::{SimulationState, TickSummary};
use pitfleet_observer::state::{AppState, TickBroadcast};
use tracing::debug;

/// Callback that bridges the tick cycle to the Observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a new observer callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl TickCallback for ObserverCallback {
    fn on_tick(&mut self, summary: &TickSummary, sim: &SimulationState) {
        // Publish before broadcasting so a client reacting to the
        // broadcast reads the matching snapshot.
        let published = self.state.controller.publish(build_snapshot(sim));

        let receivers = self.state.broadcast(&TickBroadcast::from(summary));
        debug!(
            tick = summary.tick,
            published,
            receivers,
            transitions = summary.transitions.len(),
            "Tick broadcast sent"
        );
    }
}
