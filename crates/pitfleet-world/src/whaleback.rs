//! Built-in demo scenario: the Whaleback open pit near Newman, WA.
//!
//! Two closed haul loops share the main haul road: Pit 1 face to the
//! north-west waste dump, and Pit 2 face to the ROM pad at the crusher.
//! Coordinates are approximate and intended for demonstration.

use pitfleet_types::{DigEquipment, LatLng, RouteId, SiteId, SiteKind, TipEdgeId, TipNodeId};

use crate::error::WorldError;
use crate::scenario::{DumpDef, RouteDef, Scenario, ScenarioDef};
use crate::sites::{AuxSite, DigFace, TipEdge, TipNode};
use crate::zones::{SpeedZone, ZoneShape};

/// Shorthand taking `(lng, lat)` pairs in the order haul road surveys list them.
const fn p(lng: f64, lat: f64) -> LatLng {
    LatLng::new(lat, lng)
}

fn ring(corners: &[(f64, f64)]) -> Vec<LatLng> {
    corners.iter().map(|&(lng, lat)| p(lng, lat)).collect()
}

fn rect(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Vec<LatLng> {
    ring(&[
        (min_lng, min_lat),
        (max_lng, min_lat),
        (max_lng, max_lat),
        (min_lng, max_lat),
        (min_lng, min_lat),
    ])
}

fn node(id: &str, dump: &str, location: LatLng) -> TipNode {
    TipNode {
        id: TipNodeId::from(id),
        dump_id: SiteId::from(dump),
        location,
    }
}

/// The raw Whaleback scenario definition.
pub fn whaleback_def() -> ScenarioDef {
    let dig_a = p(119.6726, -23.3640);
    let dig_b = p(119.6948, -23.3682);
    let tn_a1 = p(119.6544, -23.3588);
    let tn_a2 = p(119.6609, -23.3550);
    let tn_b1 = p(119.6970, -23.3658);
    let tn_b2 = p(119.7009, -23.3636);

    let te_a_path = vec![
        tn_a1,
        p(119.6562, -23.3582),
        p(119.6583, -23.3572),
        p(119.6598, -23.3562),
        tn_a2,
    ];
    let te_b_path = vec![
        tn_b1,
        p(119.6982, -23.3652),
        p(119.6994, -23.3644),
        p(119.7003, -23.3640),
        tn_b2,
    ];

    // Pit 1 loop: down the Pit 1 ramp to the face, west along the haul
    // loop to the waste dump, across the tip edge, and back south.
    let pit1_junction = p(119.6672, -23.3728);
    let mut pit1_loop = vec![
        pit1_junction,
        p(119.6690, -23.3708),
        p(119.6702, -23.3686),
        p(119.6716, -23.3662),
        dig_a,
        p(119.6670, -23.3590),
    ];
    pit1_loop.extend(te_a_path.iter().copied());
    pit1_loop.extend([p(119.6614, -23.3656), pit1_junction]);

    // Pit 2 loop: along the Pit 2 ramp to the face, east to the ROM pad,
    // across the tip edge, and back along the haul loop.
    let pit2_junction = p(119.6846, -23.3722);
    let mut pit2_loop = vec![
        pit2_junction,
        p(119.6886, -23.3722),
        p(119.6908, -23.3714),
        p(119.6926, -23.3702),
        p(119.6938, -23.3692),
        dig_b,
    ];
    pit2_loop.extend(te_b_path.iter().copied());
    pit2_loop.extend([p(119.6990, -23.3640), p(119.6926, -23.3680), pit2_junction]);

    ScenarioDef {
        name: "Whaleback".to_owned(),
        routes: vec![
            RouteDef {
                id: RouteId::from("HR-PIT1-WASTE"),
                name: "Pit 1 to Waste Dump (NW)".to_owned(),
                waypoints: pit1_loop,
                dig_id: Some(SiteId::from("DIG-A")),
                dump_id: Some(SiteId::from("DUMP-A")),
                home: None,
            },
            RouteDef {
                id: RouteId::from("HR-PIT2-ROM"),
                name: "Pit 2 to ROM Pad".to_owned(),
                waypoints: pit2_loop,
                dig_id: Some(SiteId::from("DIG-B")),
                dump_id: Some(SiteId::from("DUMP-B")),
                home: None,
            },
        ],
        dig_faces: vec![
            DigFace {
                id: SiteId::from("DIG-A"),
                name: "Whaleback Pit 1 Face".to_owned(),
                equipment: DigEquipment::Excavator,
                model: Some("EX1200".to_owned()),
                location: dig_a,
            },
            DigFace {
                id: SiteId::from("DIG-B"),
                name: "Whaleback Pit 2 Face".to_owned(),
                equipment: DigEquipment::Excavator,
                model: Some("PC2000".to_owned()),
                location: dig_b,
            },
        ],
        dumps: vec![
            DumpDef {
                id: SiteId::from("DUMP-A"),
                name: "Waste Dump (NW)".to_owned(),
                outline: rect(119.6538, -23.3595, 119.6625, -23.3532),
                default_tip_edge_id: TipEdgeId::from("TE-A"),
            },
            DumpDef {
                id: SiteId::from("DUMP-B"),
                name: "ROM Pad / Crusher".to_owned(),
                outline: rect(119.6966, -23.3662, 119.7016, -23.3628),
                default_tip_edge_id: TipEdgeId::from("TE-B"),
            },
        ],
        tip_nodes: vec![
            node("TN-A1", "DUMP-A", tn_a1),
            node("TN-A2", "DUMP-A", tn_a2),
            node("TN-B1", "DUMP-B", tn_b1),
            node("TN-B2", "DUMP-B", tn_b2),
        ],
        tip_edges: vec![
            TipEdge {
                id: TipEdgeId::from("TE-A"),
                dump_id: SiteId::from("DUMP-A"),
                from: TipNodeId::from("TN-A1"),
                to: TipNodeId::from("TN-A2"),
                path: te_a_path,
            },
            TipEdge {
                id: TipEdgeId::from("TE-A-ENTRY"),
                dump_id: SiteId::from("DUMP-A"),
                from: TipNodeId::from("TN-A2"),
                to: TipNodeId::from("TN-A1"),
                path: Vec::new(),
            },
            TipEdge {
                id: TipEdgeId::from("TE-B"),
                dump_id: SiteId::from("DUMP-B"),
                from: TipNodeId::from("TN-B1"),
                to: TipNodeId::from("TN-B2"),
                path: te_b_path,
            },
        ],
        zones: vec![
            SpeedZone {
                name: "Pit 1 Shovel Area".to_owned(),
                shape: ZoneShape::Circle {
                    center: dig_a,
                    radius_m: 80.0,
                },
                speed_limit_kph: 12.0,
            },
            SpeedZone {
                name: "Pit 2 Shovel Area".to_owned(),
                shape: ZoneShape::Circle {
                    center: dig_b,
                    radius_m: 80.0,
                },
                speed_limit_kph: 12.0,
            },
            SpeedZone {
                name: "ROM Pad / Crusher".to_owned(),
                shape: ZoneShape::Polygon {
                    ring: rect(119.6966, -23.3662, 119.7016, -23.3628),
                },
                speed_limit_kph: 15.0,
            },
            SpeedZone {
                name: "Workshop Precinct".to_owned(),
                shape: ZoneShape::Polygon {
                    ring: rect(119.6756, -23.3747, 119.6776, -23.3732),
                },
                speed_limit_kph: 10.0,
            },
        ],
        aux_sites: vec![
            AuxSite {
                id: SiteId::from("FUEL-BAY"),
                name: "Fuel Bay".to_owned(),
                kind: SiteKind::Fuel,
                location: p(119.6890, -23.3576),
            },
            AuxSite {
                id: SiteId::from("WORKSHOP"),
                name: "Workshop".to_owned(),
                kind: SiteKind::Workshop,
                location: p(119.6765, -23.3740),
            },
            AuxSite {
                id: SiteId::from("CRUSHER"),
                name: "Primary Crusher".to_owned(),
                kind: SiteKind::Crusher,
                location: p(119.7010, -23.3636),
            },
        ],
    }
}

/// Build and validate the Whaleback scenario.
pub fn create_whaleback() -> Result<Scenario, WorldError> {
    Scenario::build(whaleback_def())
}
