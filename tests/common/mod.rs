//! Shared test fixtures: a miniature two-release VIS.
//!
//! The fixture mirrors the shape of the production taxonomy — an asset root,
//! function groups and leaves, product-type assignments, a selection, and an
//! assignment loop — at a size where every expected path is checkable by
//! hand.
//!
//! Release 3-4a:
//!
//! ```text
//! VE ── 400a ── 410 ─┬─ 411 ─┬─ 411.1 ── C101 ── C101.3 ── C101.31
//!                    │       ├─ 411.2 ── CS1 ── C102a ─┐
//!                    │       ├─ 411.3 ── C102a ── C102a.1 ─┘ (loop)
//!                    │       └─ 411.4 ── C201
//!                    ├─ H601
//!                    ├─ H602 ── H602.1   (H602 installSubstructure=false)
//!                    └─ 651.21s
//! ```
//!
//! Release 3-5a renames `C101 -> C103` and `C102a -> C104a`, and moves
//! `C201` below a new group `C201grp`.

// Not every test binary touches every fixture.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use vista_rs::dto::{GmodDto, GmodVersioningDto, LocationsDto};
use vista_rs::resources::MemoryResources;
use vista_rs::{Gmod, Locations, Vis, VisVersion};

fn node(code: &str, category: &str, node_type: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "code": code,
        "category": category,
        "type": node_type,
        "name": name
    })
}

fn common_nodes() -> Vec<serde_json::Value> {
    vec![
        node("VE", "ASSET", "TYPE", "Vessel"),
        node("400a", "PRODUCT", "TYPE", "Ship systems"),
        node("410", "ASSET FUNCTION", "GROUP", "Main functions"),
        node("411", "ASSET FUNCTION", "GROUP", "Propulsion"),
        serde_json::json!({
            "code": "411.1",
            "category": "ASSET FUNCTION",
            "type": "LEAF",
            "name": "Propulsion engine arrangement",
            "commonName": "Main engine arrangement",
            "normalAssignmentNames": { "C101": "propulsion engine", "C103": "propulsion engine" }
        }),
        node("411.2", "ASSET FUNCTION", "LEAF", "Propulsion engine system"),
        node("411.3", "ASSET FUNCTION", "LEAF", "Propulsion drive arrangement"),
        node("411.4", "ASSET FUNCTION", "LEAF", "Propulsion auxiliary arrangement"),
        node("CS1", "PRODUCT", "SELECTION", "Engine selection"),
        node("C101.3", "PRODUCT FUNCTION", "COMPOSITION", "Cylinder arrangement"),
        node("C101.31", "PRODUCT FUNCTION", "LEAF", "Cylinder unit"),
        node("C102a.1", "PRODUCT FUNCTION", "LEAF", "Drive control"),
        node("C201", "PRODUCT FUNCTION", "LEAF", "Auxiliary unit"),
        node("H601", "ASSET FUNCTION", "LEAF", "Hull opening arrangement"),
        serde_json::json!({
            "code": "H602",
            "category": "ASSET FUNCTION",
            "type": "LEAF",
            "name": "Uninstalled arrangement",
            "installSubstructure": false
        }),
        node("H602.1", "PRODUCT FUNCTION", "LEAF", "Uninstalled unit"),
        node("651.21s", "ASSET FUNCTION", "LEAF", "Ballast system section"),
    ]
}

fn common_relations() -> Vec<[&'static str; 2]> {
    vec![
        ["VE", "400a"],
        ["400a", "410"],
        ["410", "411"],
        ["410", "H601"],
        ["410", "H602"],
        ["H602", "H602.1"],
        ["410", "651.21s"],
        ["411", "411.1"],
        ["411", "411.2"],
        ["411", "411.3"],
        ["411", "411.4"],
        ["411.2", "CS1"],
    ]
}

pub fn gmod_dto_3_4a() -> GmodDto {
    let mut items = common_nodes();
    items.push(node("C101", "PRODUCT", "TYPE", "Propulsion engine"));
    items.push(node("C102a", "PRODUCT", "TYPE", "Drive unit"));

    let mut relations = common_relations();
    relations.extend([
        ["411.1", "C101"],
        ["C101", "C101.3"],
        ["C101.3", "C101.31"],
        ["CS1", "C102a"],
        ["411.3", "C102a"],
        ["C102a", "C102a.1"],
        ["C102a.1", "C102a"],
        ["411.4", "C201"],
    ]);

    build_gmod_dto("3.4a", items, relations)
}

pub fn gmod_dto_3_5a() -> GmodDto {
    let mut items = common_nodes();
    items.push(node("C103", "PRODUCT", "TYPE", "Propulsion engine"));
    items.push(node("C104a", "PRODUCT", "TYPE", "Drive unit"));
    items.push(node("C201grp", "PRODUCT FUNCTION", "GROUP", "Auxiliary units"));

    let mut relations = common_relations();
    relations.extend([
        ["411.1", "C103"],
        ["C103", "C101.3"],
        ["C101.3", "C101.31"],
        ["CS1", "C104a"],
        ["411.3", "C104a"],
        ["C104a", "C102a.1"],
        ["C102a.1", "C104a"],
        ["411.4", "C201grp"],
        ["C201grp", "C201"],
    ]);

    build_gmod_dto("3.5a", items, relations)
}

fn build_gmod_dto(
    vis_release: &str,
    items: Vec<serde_json::Value>,
    relations: Vec<[&'static str; 2]>,
) -> GmodDto {
    serde_json::from_value(serde_json::json!({
        "visRelease": vis_release,
        "items": items,
        "relations": relations
    }))
    .expect("fixture GMOD decodes")
}

pub fn locations_dto(vis_release: &str) -> LocationsDto {
    let items: Vec<serde_json::Value> = [
        ("N", "number"),
        ("A", "aft"),
        ("C", "centre"),
        ("F", "forward"),
        ("H", "hanging"),
        ("I", "inner"),
        ("L", "lower"),
        ("M", "middle"),
        ("O", "outer"),
        ("P", "port"),
        ("S", "starboard"),
        ("U", "upper"),
        ("V", "vertical"),
    ]
    .iter()
    .map(|&(code, name)| serde_json::json!({ "code": code, "name": name }))
    .collect();

    serde_json::from_value(serde_json::json!({ "visRelease": vis_release, "items": items }))
        .expect("fixture locations decode")
}

pub fn versioning_dto() -> HashMap<String, GmodVersioningDto> {
    serde_json::from_value(serde_json::json!({
        "3-5a": {
            "visRelease": "3.5a",
            "items": {
                "C101": { "operations": ["changeCode"], "source": "C101", "target": "C103" },
                "C102a": { "operations": ["changeCode"], "source": "C102a", "target": "C104a" }
            }
        }
    }))
    .expect("fixture versioning decodes")
}

/// A `Vis` over the in-memory fixture releases.
pub fn test_vis() -> Vis {
    Vis::with_provider(
        MemoryResources::new()
            .with_gmod(VisVersion::V3_4a, gmod_dto_3_4a())
            .with_gmod(VisVersion::V3_5a, gmod_dto_3_5a())
            .with_locations(VisVersion::V3_4a, locations_dto("3.4a"))
            .with_locations(VisVersion::V3_5a, locations_dto("3.5a"))
            .with_versioning(versioning_dto()),
    )
}

pub fn test_gmod() -> Arc<Gmod> {
    test_vis().gmod(VisVersion::V3_4a).expect("fixture GMOD loads")
}

pub fn test_locations() -> Arc<Locations> {
    test_vis().locations(VisVersion::V3_4a).expect("fixture locations load")
}
