//! Fleet controller: the read and command facade for collaborators.
//!
//! Readers get the latest published [`FleetSnapshot`] as a cheap
//! [`Arc`] clone. Commands are never applied inline; they are queued on the
//! [`OperatorState`] and applied at the start of the next tick.

use std::sync::Arc;

use pitfleet_types::{
    CommandTarget, FleetCommand, FleetKpis, FleetSnapshot, QueueView, SiteId, Vehicle, VehicleDirective, VehicleId,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::operator::{OperatorState, SimulationStatus};
use crate::runner::TickCallback;
use crate::snapshot::build_snapshot;
use crate::tick::{SimulationState, TickSummary};

/// Shared handle over the published snapshot and the command queue.
#[derive(Debug, Clone)]
pub struct FleetController {
    operator: Arc<OperatorState>,
    snapshot: Arc<RwLock<Arc<FleetSnapshot>>>,
}

impl FleetController {
    /// Create a controller publishing an empty snapshot.
    pub fn new(operator: Arc<OperatorState>) -> Self {
        Self::with_snapshot(operator, FleetSnapshot::empty())
    }

    /// Create a controller with an initial snapshot (usually of the seeded fleet).
    pub fn with_snapshot(operator: Arc<OperatorState>, snapshot: FleetSnapshot) -> Self {
        Self {
            operator,
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// The operator state commands are queued on.
    pub const fn operator(&self) -> &Arc<OperatorState> {
        &self.operator
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The latest published snapshot.
    pub async fn snapshot(&self) -> Arc<FleetSnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// KPIs of the latest snapshot.
    pub async fn kpis(&self) -> FleetKpis {
        self.snapshot().await.kpis.clone()
    }

    /// All queue views of the latest snapshot, ordered by site id.
    pub async fn queues(&self) -> Vec<QueueView> {
        self.snapshot().await.queues.clone()
    }

    /// One site's queue view.
    pub async fn queue(&self, site_id: &SiteId) -> Option<QueueView> {
        self.snapshot().await.queue(site_id).cloned()
    }

    /// One vehicle from the latest snapshot.
    pub async fn vehicle(&self, id: &VehicleId) -> Option<Vehicle> {
        self.snapshot().await.vehicle(id).cloned()
    }

    /// Run status for the operator API.
    pub async fn status(&self) -> SimulationStatus {
        let snapshot = self.snapshot().await;
        SimulationStatus {
            tick: snapshot.tick,
            paused: self.operator.is_paused(),
            stop_requested: self.operator.is_stop_requested(),
            tick_interval_ms: self.operator.tick_interval_ms(),
            elapsed_seconds: self.operator.elapsed_seconds(),
            max_ticks: self.operator.max_ticks(),
            max_real_time_seconds: self.operator.max_real_time_seconds(),
            vehicles_total: snapshot.kpis.total,
            vehicles_active: snapshot.kpis.active,
            pending_commands: self.operator.pending_commands().await,
            end_reason: self.operator.end_reason(),
            started_at: self.operator.started_at().to_rfc3339(),
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Queue a command for the next tick.
    pub async fn submit(&self, command: FleetCommand) {
        debug!(command = command.kind(), "Fleet command queued");
        self.operator.submit_command(command).await;
    }

    /// Queue a phase directive for one vehicle or the whole fleet.
    pub async fn directive(&self, directive: VehicleDirective, target: CommandTarget) {
        self.submit(FleetCommand::Vehicle { directive, target }).await;
    }

    /// Queue a fleet-wide stop to idle.
    pub async fn stop_all(&self) {
        self.submit(FleetCommand::StopAll).await;
    }

    // -----------------------------------------------------------------------
    // Publication
    // -----------------------------------------------------------------------

    /// Replace the published snapshot without waiting on readers.
    ///
    /// Returns `false` if the lock was busy and this snapshot was skipped.
    pub fn publish(&self, snapshot: FleetSnapshot) -> bool {
        let tick = snapshot.tick;
        self.snapshot.try_write().map_or_else(
            |_| {
                warn!(tick, "Snapshot lock busy, skipping publication");
                false
            },
            |mut guard| {
                *guard = Arc::new(snapshot);
                true
            },
        )
    }

    /// Replace the published snapshot, waiting for readers to release the lock.
    ///
    /// Used once the run has ended so the last state is never skipped.
    pub async fn publish_final(&self, snapshot: FleetSnapshot) {
        let tick = snapshot.tick;
        *self.snapshot.write().await = Arc::new(snapshot);
        debug!(tick, "Final snapshot published");
    }
}

/// Tick callback that publishes a fresh snapshot after every tick.
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    controller: FleetController,
}

impl SnapshotPublisher {
    /// Publish through `controller`.
    pub const fn new(controller: FleetController) -> Self {
        Self { controller }
    }
}

impl TickCallback for SnapshotPublisher {
    fn on_tick(&mut self, _summary: &TickSummary, state: &SimulationState) {
        self.controller.publish(build_snapshot(state));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SimulationBoundsConfig;

    fn controller() -> FleetController {
        FleetController::new(Arc::new(OperatorState::new(1000, &SimulationBoundsConfig::default())))
    }

    #[tokio::test]
    async fn empty_until_first_publication() {
        let controller = controller();
        let snap = controller.snapshot().await;
        assert_eq!(snap.tick, 0);
        assert!(snap.vehicles.is_empty());
        assert!(controller.vehicle(&VehicleId::from("TRK-01")).await.is_none());
    }

    #[tokio::test]
    async fn publish_replaces_snapshot_and_old_arc_survives() {
        let controller = controller();
        let before = controller.snapshot().await;
        let mut next = FleetSnapshot::empty();
        next.tick = 7;
        assert!(controller.publish(next));
        assert_eq!(controller.snapshot().await.tick, 7);
        assert_eq!(before.tick, 0);
    }

    #[tokio::test]
    async fn publish_skips_while_a_reader_holds_the_lock() {
        let controller = controller();
        let guard = controller.snapshot.read().await;
        assert!(!controller.publish(FleetSnapshot::empty()));
        drop(guard);
        assert!(controller.publish(FleetSnapshot::empty()));
    }

    #[tokio::test]
    async fn final_publication_waits_for_readers() {
        let controller = controller();
        let guard = controller.snapshot.read().await;
        let mut last = FleetSnapshot::empty();
        last.tick = 42;
        let writer = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.publish_final(last).await })
        };
        tokio::task::yield_now().await;
        assert!(!writer.is_finished());
        drop(guard);
        writer.await.unwrap();
        assert_eq!(controller.snapshot().await.tick, 42);
    }

    #[tokio::test]
    async fn commands_are_queued_not_applied() {
        let controller = controller();
        controller
            .directive(VehicleDirective::Pause, CommandTarget::All)
            .await;
        assert_eq!(controller.operator().pending_commands().await, 1);
        assert_eq!(controller.status().await.pending_commands, 1);

        controller.stop_all().await;
        assert_eq!(controller.operator().pending_commands().await, 2);
    }
}
