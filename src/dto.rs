//! Resource DTOs.
//!
//! Plain serde mirrors of the three resource files: `gmod-vis-<version>`,
//! `locations-vis-<version>` and `gmod-vis-versioning`. These types cross the
//! loading boundary only — the domain types in `gmod`, `locations` and
//! `versioning` are built from them and never reference them again.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// GMOD
// ============================================================================

/// One taxonomy node descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmodNodeDto {
    pub category: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub common_definition: Option<String>,
    #[serde(default)]
    pub install_substructure: Option<bool>,
    #[serde(default)]
    pub normal_assignment_names: Option<HashMap<String, String>>,
}

/// The full taxonomy of one VIS release: node descriptors plus
/// `(parent, child)` relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmodDto {
    pub vis_release: String,
    pub items: Vec<GmodNodeDto>,
    pub relations: Vec<Vec<String>>,
}

// ============================================================================
// Locations
// ============================================================================

/// One location code character with its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeLocationDto {
    pub code: char,
    pub name: String,
    #[serde(default)]
    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsDto {
    pub vis_release: String,
    pub items: Vec<RelativeLocationDto>,
}

// ============================================================================
// Versioning
// ============================================================================

/// Conversion rule for one source code into the DTO's target release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmodNodeConversionDto {
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub old_assignment: String,
    #[serde(default)]
    pub new_assignment: String,
    #[serde(default)]
    pub delete_assignment: bool,
}

/// Conversion rules into one target VIS release, keyed by source code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmodVersioningDto {
    pub vis_release: String,
    #[serde(default)]
    pub items: HashMap<String, GmodNodeConversionDto>,
}
