//! Per-vehicle mechanics for the pitfleet haulage simulation.
//!
//! This crate contains the logic layer for haul vehicles: everything that
//! advances a single vehicle without owning the fleet or its queues. It sits
//! between `pitfleet-world` (geometry, zones, sites) and `pitfleet-core`
//! (which folds the whole fleet each tick and applies queue effects).
//!
//! # Modules
//!
//! - [`config`] -- Configurable rates and watermarks ([`FleetConfig`])
//! - [`overlay`] -- Operator directives: pause, resume, faults, forced jumps
//! - [`phase`] -- Nominal transition function and watermark override
//! - [`step`] -- One-tick advance of a single vehicle ([`step_vehicle`])
//! - [`telemetry`] -- Speed convergence and telemetry evolution

pub mod config;
pub mod overlay;
pub mod phase;
pub mod step;
pub mod telemetry;

pub use config::{FleetConfig, FleetConfigError, SpeedRange};
pub use overlay::{DirectiveOutcome, Refusal, apply_directive, dwell_site, stop_to_idle};
pub use phase::{PhaseInputs, next_phase, resolve_phase, watermark_override};
pub use step::{QueueEffect, QueueStatus, StepContext, StepOutcome, step_vehicle, travel_target};
pub use telemetry::{Evolved, TickActivity, evolve};
