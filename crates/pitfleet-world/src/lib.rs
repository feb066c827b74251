//! Mine layout for the pitfleet haulage simulation.
//!
//! This crate models the static world a haul fleet moves through: haul route
//! polylines with arc-length sampling, speed zones, dig faces and dumps with
//! their tip geometry, and the admission queues that arbitrate access to
//! loading and dumping resources.
//!
//! # Modules
//!
//! - [`admission`] -- Capacity-annotated FIFO queues for dig faces and dumps.
//! - [`error`] -- Error types for scenario validation.
//! - [`geometry`] -- Haversine distance, bearings, polyline sampling and
//!   projection.
//! - [`route`] -- [`Route`] wraps a validated polyline with its cached
//!   arc-length table and stop-point helpers.
//! - [`scenario`] -- Deserializable [`ScenarioDef`] and its validation into a
//!   [`Scenario`].
//! - [`sites`] -- Dig faces, dumps, tip nodes and tip edges.
//! - [`whaleback`] -- Built-in demo scenario.
//! - [`zones`] -- Speed zones and first-match limit lookup.

pub mod admission;
pub mod error;
pub mod geometry;
pub mod route;
pub mod scenario;
pub mod sites;
pub mod whaleback;
pub mod zones;

// Re-export primary types at crate root.
pub use admission::{
    AdmissionJob, AdmissionQueue, CapacityPolicy, DEFAULT_QUEUE_CAPACITY, EnqueueOutcome,
};
pub use error::WorldError;
pub use geometry::Projection;
pub use route::Route;
pub use scenario::{DumpDef, RouteDef, Scenario, ScenarioDef};
pub use sites::{AuxSite, DigFace, DumpSite, SiteRegistry, TipEdge, TipNode};
pub use whaleback::{create_whaleback, whaleback_def};
pub use zones::{SpeedZone, SpeedZoneIndex, ZoneShape};
