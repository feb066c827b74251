//! Observer API server for the pitfleet simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for reading the latest fleet snapshot (vehicles,
//!   KPIs, admission queues)
//! - **Command endpoint** (`POST /api/commands`) that queues fleet commands
//!   for the next tick
//! - **Operator REST endpoints** for run control (pause, resume, speed,
//!   status, stop)
//! - **`WebSocket` endpoint** (`/ws/ticks`) streaming tick summaries via
//!   [`tokio::sync::broadcast`]
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Every read is served from the [`FleetController`]'s published snapshot,
//! so the observer never blocks the tick cycle. Writes never touch state
//! directly; they are queued and applied at the next tick boundary.
//!
//! [`FleetController`]: pitfleet_core::controller::FleetController

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{ObserverHandle, spawn_observer};
pub use state::{AppState, TickBroadcast};
