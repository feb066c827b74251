//! Type-safe identifier wrappers.
//!
//! Scenario entities (vehicles, routes, sites, tip nodes and tip edges) are
//! named by the scenario author with short human-readable keys such as
//! `TRK-01`, `HR-LOOP` or `TE-A`, so their identifiers wrap a [`String`].
//! Admission jobs are created by the engine at runtime and use UUID v7
//! (time-ordered) identifiers instead.
//!
//! Distinct newtypes prevent accidentally passing a dig-face id where a
//! vehicle id is expected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around a scenario-supplied [`String`] key.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like key.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

define_key! {
    /// Unique identifier for a haul vehicle (e.g. `TRK-01`).
    VehicleId
}

define_key! {
    /// Unique identifier for a haul route.
    RouteId
}

define_key! {
    /// Unique identifier for a site: dig face, dump, fuel bay, workshop or crusher.
    SiteId
}

define_key! {
    /// Unique identifier for a tip node (an endpoint of a tip edge).
    TipNodeId
}

define_key! {
    /// Unique identifier for a tip edge (a dump's unloading approach).
    TipEdgeId
}

/// Unique identifier for an admission job held in a site queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct JobId(pub Uuid);

impl JobId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for JobId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
