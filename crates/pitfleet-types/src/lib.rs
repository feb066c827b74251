//! Shared type definitions for the pitfleet haulage simulation.
//!
//! This crate is the single source of truth for the data model shared across
//! the pitfleet workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the fleet dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifier wrappers for scenario entities and jobs
//! - [`enums`] -- Vehicle phases and site kinds
//! - [`structs`] -- Vehicles, telemetry, coordinates and snapshot views
//! - [`commands`] -- Operator command surface

pub mod commands;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use commands::{ALL_VEHICLES, CommandTarget, FleetCommand, VehicleDirective};
pub use enums::{DigEquipment, Phase, SiteKind};
pub use ids::{JobId, RouteId, SiteId, TipEdgeId, TipNodeId, VehicleId};
pub use structs::{
    FleetKpis, FleetSnapshot, LatLng, QueueSlots, QueueView, Telemetry, Vehicle,
};
