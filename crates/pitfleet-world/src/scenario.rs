//! Scenario definition and validation.
//!
//! A [`ScenarioDef`] is the raw, deserializable description of a mine layout
//! (haul routes, dig faces, dumps, tip geometry, speed zones). It is
//! validated once into a [`Scenario`]; any inconsistency is a fatal
//! [`WorldError`].

use std::collections::BTreeMap;

use pitfleet_types::{LatLng, RouteId, SiteId, TipEdgeId, TipNodeId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WorldError;
use crate::route::Route;
use crate::sites::{AuxSite, DigFace, DumpSite, SiteRegistry, TipEdge, TipNode};
use crate::zones::{SpeedZone, SpeedZoneIndex, validate_ring};

/// Raw route description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDef {
    /// Route identifier.
    pub id: RouteId,
    /// Display name.
    pub name: String,
    /// Ordered waypoints; at least two.
    pub waypoints: Vec<LatLng>,
    /// Dig face served by this route.
    #[serde(default)]
    pub dig_id: Option<SiteId>,
    /// Dump served by this route.
    #[serde(default)]
    pub dump_id: Option<SiteId>,
    /// Home anchor; defaults to the first waypoint.
    #[serde(default)]
    pub home: Option<LatLng>,
}

/// Raw dump description. Tip edges are attached from the edge list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpDef {
    /// Site identifier.
    pub id: SiteId,
    /// Display name.
    pub name: String,
    /// Pad outline; at least three distinct vertices.
    pub outline: Vec<LatLng>,
    /// Default tip edge; must belong to this dump.
    pub default_tip_edge_id: TipEdgeId,
}

/// Raw scenario description, typically loaded from YAML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioDef {
    /// Scenario name.
    #[serde(default)]
    pub name: String,
    /// Haul routes.
    #[serde(default)]
    pub routes: Vec<RouteDef>,
    /// Dig faces.
    #[serde(default)]
    pub dig_faces: Vec<DigFace>,
    /// Dump sites.
    #[serde(default)]
    pub dumps: Vec<DumpDef>,
    /// Tip nodes.
    #[serde(default)]
    pub tip_nodes: Vec<TipNode>,
    /// Tip edges.
    #[serde(default)]
    pub tip_edges: Vec<TipEdge>,
    /// Speed zones in priority order.
    #[serde(default)]
    pub zones: Vec<SpeedZone>,
    /// Fuel bays, workshops and crushers.
    #[serde(default)]
    pub aux_sites: Vec<AuxSite>,
}

/// A validated scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Routes keyed by id.
    pub routes: BTreeMap<RouteId, Route>,
    /// Site lookup tables.
    pub sites: SiteRegistry,
    /// Speed zones in priority order.
    pub zones: SpeedZoneIndex,
}

impl Scenario {
    /// Validate a definition.
    pub fn build(def: ScenarioDef) -> Result<Self, WorldError> {
        if def.routes.is_empty() {
            return Err(WorldError::EmptyScenario("routes"));
        }
        if def.dig_faces.is_empty() {
            return Err(WorldError::EmptyScenario("dig faces"));
        }
        if def.dumps.is_empty() {
            return Err(WorldError::EmptyScenario("dumps"));
        }

        // --- Sites -----------------------------------------------------------
        let mut digs = BTreeMap::new();
        for dig in def.dig_faces {
            if digs.contains_key(&dig.id) {
                return Err(WorldError::DuplicateSite(dig.id));
            }
            check_point(&format!("dig face {}", dig.id), dig.location)?;
            digs.insert(dig.id.clone(), dig);
        }

        let mut aux = BTreeMap::new();
        for site in def.aux_sites {
            if digs.contains_key(&site.id) || aux.contains_key(&site.id) {
                return Err(WorldError::DuplicateSite(site.id));
            }
            check_point(&format!("site {}", site.id), site.location)?;
            aux.insert(site.id.clone(), site);
        }

        let mut dumps: BTreeMap<SiteId, DumpSite> = BTreeMap::new();
        for dump in def.dumps {
            if digs.contains_key(&dump.id) || aux.contains_key(&dump.id) || dumps.contains_key(&dump.id)
            {
                return Err(WorldError::DuplicateSite(dump.id));
            }
            validate_ring(&format!("dump {}", dump.id), &dump.outline)?;
            dumps.insert(
                dump.id.clone(),
                DumpSite {
                    id: dump.id,
                    name: dump.name,
                    outline: dump.outline,
                    tip_edge_ids: Vec::new(),
                    default_tip_edge_id: dump.default_tip_edge_id,
                },
            );
        }

        // --- Tip geometry ----------------------------------------------------
        let mut tip_nodes: BTreeMap<TipNodeId, TipNode> = BTreeMap::new();
        for node in def.tip_nodes {
            if tip_nodes.contains_key(&node.id) {
                return Err(WorldError::DuplicateTipNode(node.id));
            }
            if !dumps.contains_key(&node.dump_id) {
                return Err(WorldError::UnknownDump {
                    context: format!("tip node {}", node.id),
                    site: node.dump_id,
                });
            }
            check_point(&format!("tip node {}", node.id), node.location)?;
            tip_nodes.insert(node.id.clone(), node);
        }

        let mut tip_edges: BTreeMap<TipEdgeId, TipEdge> = BTreeMap::new();
        for edge in def.tip_edges {
            if tip_edges.contains_key(&edge.id) {
                return Err(WorldError::DuplicateTipEdge(edge.id));
            }
            let Some(dump) = dumps.get_mut(&edge.dump_id) else {
                return Err(WorldError::UnknownDump {
                    context: format!("tip edge {}", edge.id),
                    site: edge.dump_id,
                });
            };
            for node_id in [&edge.from, &edge.to] {
                let node = tip_nodes.get(node_id).ok_or_else(|| WorldError::UnknownTipNode {
                    edge: edge.id.clone(),
                    node: node_id.clone(),
                })?;
                if node.dump_id != edge.dump_id {
                    return Err(WorldError::TipEdgeNotOnDump {
                        edge: edge.id.clone(),
                        dump: edge.dump_id.clone(),
                    });
                }
            }
            if let Some(bad) = edge.path.iter().find(|p| !p.is_valid()) {
                return Err(WorldError::coordinate(format!("tip edge {}", edge.id), bad.lat, bad.lng));
            }
            dump.tip_edge_ids.push(edge.id.clone());
            tip_edges.insert(edge.id.clone(), edge);
        }

        for dump in dumps.values() {
            match tip_edges.get(&dump.default_tip_edge_id) {
                None => return Err(WorldError::UnknownTipEdge(dump.default_tip_edge_id.clone())),
                Some(edge) if edge.dump_id != dump.id => {
                    return Err(WorldError::TipEdgeNotOnDump {
                        edge: edge.id.clone(),
                        dump: dump.id.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        // --- Routes ----------------------------------------------------------
        let mut routes = BTreeMap::new();
        for def_route in def.routes {
            if routes.contains_key(&def_route.id) {
                return Err(WorldError::DuplicateRoute(def_route.id));
            }
            if let Some(dig_id) = &def_route.dig_id {
                if !digs.contains_key(dig_id) {
                    return Err(WorldError::UnknownDig {
                        context: format!("route {}", def_route.id),
                        site: dig_id.clone(),
                    });
                }
            }
            if let Some(dump_id) = &def_route.dump_id {
                if !dumps.contains_key(dump_id) {
                    return Err(WorldError::UnknownDump {
                        context: format!("route {}", def_route.id),
                        site: dump_id.clone(),
                    });
                }
            }
            let mut route = Route::new(def_route.id.clone(), def_route.name, def_route.waypoints)?
                .with_sites(def_route.dig_id, def_route.dump_id);
            if let Some(home) = def_route.home {
                route = route.with_home(home)?;
            }
            routes.insert(def_route.id, route);
        }

        let zones = SpeedZoneIndex::new(def.zones)?;

        info!(
            scenario = %def.name,
            routes = routes.len(),
            digs = digs.len(),
            dumps = dumps.len(),
            tip_edges = tip_edges.len(),
            zones = zones.zones().len(),
            "Scenario validated"
        );

        Ok(Self {
            name: def.name,
            routes,
            sites: SiteRegistry::from_parts(digs, dumps, tip_nodes, tip_edges, aux),
            zones,
        })
    }

    /// Look up a route.
    pub fn route(&self, id: &RouteId) -> Option<&Route> {
        self.routes.get(id)
    }
}

fn check_point(context: &str, p: LatLng) -> Result<(), WorldError> {
    if p.is_valid() {
        Ok(())
    } else {
        Err(WorldError::coordinate(context, p.lat, p.lng))
    }
}
