//! Dig faces, dump sites, tip nodes, tip edges, and auxiliary sites.
//!
//! The [`SiteRegistry`] is immutable after scenario load with one exception:
//! the operator may change a dump's default tip edge. Changing the default
//! never rewrites existing vehicle assignments.

use std::collections::BTreeMap;

use pitfleet_types::{DigEquipment, LatLng, SiteId, SiteKind, TipEdgeId, TipNodeId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WorldError;

/// A dig face worked by a loading unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigFace {
    /// Site identifier.
    pub id: SiteId,
    /// Display name.
    pub name: String,
    /// Loading equipment working the face.
    pub equipment: DigEquipment,
    /// Loading unit model, for display.
    #[serde(default)]
    pub model: Option<String>,
    /// Loading point.
    pub location: LatLng,
}

/// A dump or ROM pad with its tip edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpSite {
    /// Site identifier.
    pub id: SiteId,
    /// Display name.
    pub name: String,
    /// Pad outline.
    pub outline: Vec<LatLng>,
    /// Tip edges on this dump, in declaration order.
    #[serde(default)]
    pub tip_edge_ids: Vec<TipEdgeId>,
    /// Edge assigned to vehicles newly sent to this dump.
    pub default_tip_edge_id: TipEdgeId,
}

/// An endpoint of a tip edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipNode {
    /// Node identifier.
    pub id: TipNodeId,
    /// Owning dump.
    pub dump_id: SiteId,
    /// Node location.
    pub location: LatLng,
}

/// A dump's unloading approach between two tip nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipEdge {
    /// Edge identifier.
    pub id: TipEdgeId,
    /// Owning dump.
    pub dump_id: SiteId,
    /// Approach start node.
    pub from: TipNodeId,
    /// Tipping node; its location is the tip point.
    pub to: TipNodeId,
    /// Optional detailed path between the nodes, for display.
    #[serde(default)]
    pub path: Vec<LatLng>,
}

/// A fuel bay, workshop or crusher carried for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxSite {
    /// Site identifier.
    pub id: SiteId,
    /// Display name.
    pub name: String,
    /// Site role.
    pub kind: SiteKind,
    /// Site location.
    pub location: LatLng,
}

/// Lookup tables for every site in a scenario.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteRegistry {
    digs: BTreeMap<SiteId, DigFace>,
    dumps: BTreeMap<SiteId, DumpSite>,
    tip_nodes: BTreeMap<TipNodeId, TipNode>,
    tip_edges: BTreeMap<TipEdgeId, TipEdge>,
    aux: BTreeMap<SiteId, AuxSite>,
}

impl SiteRegistry {
    /// Build a registry from already-validated parts.
    pub(crate) const fn from_parts(
        digs: BTreeMap<SiteId, DigFace>,
        dumps: BTreeMap<SiteId, DumpSite>,
        tip_nodes: BTreeMap<TipNodeId, TipNode>,
        tip_edges: BTreeMap<TipEdgeId, TipEdge>,
        aux: BTreeMap<SiteId, AuxSite>,
    ) -> Self {
        Self {
            digs,
            dumps,
            tip_nodes,
            tip_edges,
            aux,
        }
    }

    /// Look up a dig face.
    pub fn dig(&self, id: &SiteId) -> Option<&DigFace> {
        self.digs.get(id)
    }

    /// Look up a dump site.
    pub fn dump(&self, id: &SiteId) -> Option<&DumpSite> {
        self.dumps.get(id)
    }

    /// Look up a tip node.
    pub fn tip_node(&self, id: &TipNodeId) -> Option<&TipNode> {
        self.tip_nodes.get(id)
    }

    /// Look up a tip edge.
    pub fn tip_edge(&self, id: &TipEdgeId) -> Option<&TipEdge> {
        self.tip_edges.get(id)
    }

    /// Look up an auxiliary site.
    pub fn aux(&self, id: &SiteId) -> Option<&AuxSite> {
        self.aux.get(id)
    }

    /// Dig faces ordered by id.
    pub fn digs(&self) -> impl Iterator<Item = &DigFace> {
        self.digs.values()
    }

    /// Dump sites ordered by id.
    pub fn dumps(&self) -> impl Iterator<Item = &DumpSite> {
        self.dumps.values()
    }

    /// Auxiliary sites ordered by id.
    pub fn aux_sites(&self) -> impl Iterator<Item = &AuxSite> {
        self.aux.values()
    }

    /// Ids of every site with an admission queue (dig faces and dumps), ordered.
    pub fn queued_site_ids(&self) -> Vec<SiteId> {
        let mut ids: Vec<SiteId> = self.digs.keys().chain(self.dumps.keys()).cloned().collect();
        ids.sort();
        ids
    }

    /// The tip point of an edge: the location of its `to` node.
    pub fn tip_point(&self, edge_id: &TipEdgeId) -> Option<LatLng> {
        let edge = self.tip_edges.get(edge_id)?;
        self.tip_nodes.get(&edge.to).map(|n| n.location)
    }

    /// Whether `edge_id` is one of `dump_id`'s tip edges.
    pub fn edge_on_dump(&self, edge_id: &TipEdgeId, dump_id: &SiteId) -> bool {
        self.tip_edges
            .get(edge_id)
            .is_some_and(|e| &e.dump_id == dump_id)
    }

    /// The dump's current default tip edge.
    pub fn default_tip_edge(&self, dump_id: &SiteId) -> Option<&TipEdgeId> {
        self.dumps.get(dump_id).map(|d| &d.default_tip_edge_id)
    }

    /// Change a dump's default tip edge.
    ///
    /// Vehicles already assigned to the dump keep their current edge.
    pub fn set_dump_default_tip_edge(
        &mut self,
        dump_id: &SiteId,
        edge_id: &TipEdgeId,
    ) -> Result<(), WorldError> {
        if !self.tip_edges.contains_key(edge_id) {
            return Err(WorldError::UnknownTipEdge(edge_id.clone()));
        }
        if !self.edge_on_dump(edge_id, dump_id) {
            return Err(WorldError::TipEdgeNotOnDump {
                edge: edge_id.clone(),
                dump: dump_id.clone(),
            });
        }
        let dump = self
            .dumps
            .get_mut(dump_id)
            .ok_or_else(|| WorldError::UnknownDump {
                context: "default tip edge update".to_owned(),
                site: dump_id.clone(),
            })?;
        dump.default_tip_edge_id = edge_id.clone();
        info!(dump = %dump_id, tip_edge = %edge_id, "Dump default tip edge changed");
        Ok(())
    }
}
