//! Engine binary for the pitfleet haulage simulation.
//!
//! Wires the scenario, the seeded fleet, the tick loop and the Observer API
//! together, then runs until a bound is reached, the operator stops the run,
//! or the process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `pitfleet-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Load the scenario (Whaleback unless a scenario file is configured)
//! 4. Seed the fleet from the world seed
//! 5. Create operator state from simulation bounds
//! 6. Start the Observer API server
//! 7. Run the simulation loop on a background task
//! 8. Log the result

mod error;
mod observer_callback;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use pitfleet_core::config::SimulationConfig;
use pitfleet_core::controller::{FleetController, SnapshotPublisher};
use pitfleet_core::operator::OperatorState;
use pitfleet_core::runner::{self, SimulationHandle, TickCallback};
use pitfleet_core::seeding::seed_fleet;
use pitfleet_core::snapshot::build_snapshot;
use pitfleet_core::tick::SimulationState;
use pitfleet_observer::state::AppState;
use pitfleet_observer::{ServerConfig, spawn_observer};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer_callback::ObserverCallback;

const DEFAULT_CONFIG_PATH: &str = "pitfleet-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = SimulationConfig::load_or_default(&config_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        config = %config_path.display(),
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        seconds_per_tick = config.world.seconds_per_tick,
        "pitfleet-engine starting"
    );

    run(&config).await?;
    Ok(())
}

async fn run(config: &SimulationConfig) -> Result<(), EngineError> {
    // 3. Load the scenario.
    let scenario = config.scenario.load()?;
    info!(
        scenario = scenario.name,
        routes = scenario.routes.len(),
        "Scenario loaded"
    );

    // 4. Seed the fleet.
    let mut rng = SmallRng::seed_from_u64(config.world.seed);
    let fleet = seed_fleet(&scenario, config.world.vehicle_count, &mut rng, Utc::now())?;
    info!(vehicles = fleet.len(), "Fleet seeded");

    let state = SimulationState::new(scenario, fleet, config, rng)?;

    // 5. Create operator state.
    let operator = Arc::new(OperatorState::new(config.world.tick_interval_ms, &config.simulation));
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );

    let controller = FleetController::with_snapshot(Arc::clone(&operator), build_snapshot(&state));

    // 6. Start the Observer API server.
    let mut observer_handle = None;
    let callback: Box<dyn TickCallback> = if config.observer.enabled {
        let app_state = Arc::new(AppState::new(controller.clone()));
        let observer = spawn_observer(&ServerConfig::from(&config.observer), Arc::clone(&app_state)).await?;
        info!(addr = %observer.addr, "Observer API server started");
        observer_handle = Some(observer);
        Box::new(ObserverCallback::new(app_state))
    } else {
        info!("Observer disabled");
        Box::new(SnapshotPublisher::new(controller.clone()))
    };

    // 7. Run the simulation until it ends or Ctrl-C arrives.
    let handle = SimulationHandle::spawn_published(state, controller, callback);
    let stopper = Arc::clone(&operator);
    let signal_task = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping after the current tick");
                stopper.request_stop();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    let (final_state, result) = handle.join().await?;
    signal_task.abort();
    if let Some(observer) = observer_handle {
        observer.task.abort();
    }

    // 8. Log results.
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        tons_dumped = final_state.tons_dumped_total,
        "pitfleet-engine shutdown complete"
    );

    Ok(())
}
