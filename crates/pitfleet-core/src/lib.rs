//! Simulation clock, tick fold, fleet controller, and runner for the
//! pitfleet haulage simulation.
//!
//! This crate owns the simulation context: a [`SimulationState`] holding the
//! validated scenario, the fleet and the admission queues is folded forward
//! one tick at a time by [`run_tick`], driven on a wall-clock interval by
//! [`run_simulation`].
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and simulated time.
//! - [`commands`] -- Validation and application of operator commands at the
//!   tick boundary.
//! - [`config`] -- Configuration loading from `pitfleet-config.yaml` into
//!   strongly-typed structs.
//! - [`controller`] -- [`FleetController`] snapshot and command facade.
//! - [`operator`] -- Run-level pause, resume, speed, stop and command queue.
//! - [`runner`] -- The async tick loop and [`SimulationHandle`].
//! - [`seeding`] -- Initial fleet placement along the scenario's routes.
//! - [`snapshot`] -- Snapshot and KPI derivation.
//! - [`tick`] -- The per-tick fold.
//!
//! [`SimulationState`]: tick::SimulationState
//! [`run_tick`]: tick::run_tick
//! [`run_simulation`]: runner::run_simulation
//! [`FleetController`]: controller::FleetController
//! [`SimulationHandle`]: runner::SimulationHandle

pub mod clock;
pub mod commands;
pub mod config;
pub mod controller;
pub mod operator;
pub mod runner;
pub mod seeding;
pub mod snapshot;
pub mod tick;
