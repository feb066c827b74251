//! Error types for the `pitfleet-world` crate.
//!
//! Every validation failure while building a scenario is reported as a
//! [`WorldError`]. Scenario errors are fatal at load time; the running
//! simulation never produces them.

use pitfleet_types::{RouteId, SiteId, TipEdgeId, TipNodeId};

/// Errors that can occur while building or mutating world configuration.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A route has fewer than two waypoints.
    #[error("route {route} needs at least 2 waypoints, got {count}")]
    RouteTooShort {
        /// The offending route.
        route: RouteId,
        /// Number of waypoints supplied.
        count: usize,
    },

    /// A coordinate is non-finite or outside WGS84 bounds.
    #[error("invalid coordinate in {context}: lat {lat}, lng {lng}")]
    InvalidCoordinate {
        /// Where the coordinate was found.
        context: String,
        /// Latitude supplied.
        lat: f64,
        /// Longitude supplied.
        lng: f64,
    },

    /// A polygon ring has fewer than three distinct vertices.
    #[error("polygon for {context} needs at least 3 distinct vertices, got {count}")]
    DegeneratePolygon {
        /// Zone or dump the ring belongs to.
        context: String,
        /// Number of distinct vertices found.
        count: usize,
    },

    /// A speed zone has a non-positive or non-finite speed cap.
    #[error("speed zone {zone} has invalid speed cap {speed_limit_kph}")]
    InvalidSpeedCap {
        /// Zone name.
        zone: String,
        /// Cap supplied.
        speed_limit_kph: f64,
    },

    /// A circular speed zone has a non-positive or non-finite radius.
    #[error("speed zone {zone} has invalid radius {radius_m}")]
    InvalidRadius {
        /// Zone name.
        zone: String,
        /// Radius supplied.
        radius_m: f64,
    },

    /// A route id appears more than once.
    #[error("duplicate route id: {0}")]
    DuplicateRoute(RouteId),

    /// A site id appears more than once across dig faces, dumps and auxiliary sites.
    #[error("duplicate site id: {0}")]
    DuplicateSite(SiteId),

    /// A tip node id appears more than once.
    #[error("duplicate tip node id: {0}")]
    DuplicateTipNode(TipNodeId),

    /// A tip edge id appears more than once.
    #[error("duplicate tip edge id: {0}")]
    DuplicateTipEdge(TipEdgeId),

    /// A reference names a dig face that does not exist.
    #[error("{context} references unknown dig face {site}")]
    UnknownDig {
        /// Referencing entity.
        context: String,
        /// Missing dig face.
        site: SiteId,
    },

    /// A reference names a dump site that does not exist.
    #[error("{context} references unknown dump {site}")]
    UnknownDump {
        /// Referencing entity.
        context: String,
        /// Missing dump.
        site: SiteId,
    },

    /// A tip edge references a node that does not exist.
    #[error("tip edge {edge} references unknown tip node {node}")]
    UnknownTipNode {
        /// The referencing edge.
        edge: TipEdgeId,
        /// Missing node.
        node: TipNodeId,
    },

    /// A tip edge id is not known.
    #[error("unknown tip edge: {0}")]
    UnknownTipEdge(TipEdgeId),

    /// A tip edge or node belongs to a different dump than expected.
    #[error("tip edge {edge} does not belong to dump {dump}")]
    TipEdgeNotOnDump {
        /// The edge.
        edge: TipEdgeId,
        /// The dump it was expected to belong to.
        dump: SiteId,
    },

    /// A scenario with no routes, dig faces or dumps cannot be simulated.
    #[error("scenario is missing {0}")]
    EmptyScenario(&'static str),
}

impl WorldError {
    /// Convenience for coordinate failures.
    pub(crate) fn coordinate(context: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self::InvalidCoordinate {
            context: context.into(),
            lat,
            lng,
        }
    }
}
