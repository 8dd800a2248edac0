//! Taxonomy node records.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dto::GmodNodeDto;
use crate::locations::Location;
use crate::vis_version::VisVersion;

use super::Gmod;

/// Opaque node identifier: an index into the owning [`Gmod`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable descriptive metadata of a taxonomy node.
#[derive(Debug, Clone, PartialEq)]
pub struct GmodNodeMetadata {
    category: String,
    node_type: String,
    full_type: String,
    name: String,
    common_name: Option<String>,
    definition: Option<String>,
    common_definition: Option<String>,
    install_substructure: Option<bool>,
    normal_assignment_names: HashMap<String, String>,
}

impl GmodNodeMetadata {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// `category + " " + type`, e.g. `ASSET FUNCTION LEAF`.
    pub fn full_type(&self) -> &str {
        &self.full_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub fn common_definition(&self) -> Option<&str> {
        self.common_definition.as_deref()
    }

    pub fn install_substructure(&self) -> Option<bool> {
        self.install_substructure
    }

    /// Child code -> display name overrides for normal assignments.
    pub fn normal_assignment_names(&self) -> &HashMap<String, String> {
        &self.normal_assignment_names
    }
}

/// One node of the taxonomy, optionally decorated with a [`Location`].
///
/// Node values are cheap to clone: metadata is shared behind an `Arc`, and
/// graph structure lives on the owning [`Gmod`], reachable through the `id`.
/// Equality and hashing consider `(code, location)` only.
#[derive(Debug, Clone)]
pub struct GmodNode {
    id: NodeId,
    code: String,
    location: Option<Location>,
    vis_version: VisVersion,
    metadata: Arc<GmodNodeMetadata>,
}

impl GmodNode {
    pub(crate) fn new(id: NodeId, vis_version: VisVersion, dto: &GmodNodeDto) -> Self {
        Self {
            id,
            code: dto.code.clone(),
            location: None,
            vis_version,
            metadata: Arc::new(GmodNodeMetadata {
                category: dto.category.clone(),
                node_type: dto.node_type.clone(),
                full_type: format!("{} {}", dto.category, dto.node_type),
                name: dto.name.clone(),
                common_name: dto.common_name.clone(),
                definition: dto.definition.clone(),
                common_definition: dto.common_definition.clone(),
                install_substructure: dto.install_substructure,
                normal_assignment_names: dto
                    .normal_assignment_names
                    .clone()
                    .unwrap_or_default(),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn metadata(&self) -> &GmodNodeMetadata {
        &self.metadata
    }

    // ------------------------------------------------------------------------
    // Location decoration
    // ------------------------------------------------------------------------

    /// A copy of this node carrying `location`.
    pub fn with_location(&self, location: Location) -> GmodNode {
        let mut node = self.clone();
        node.location = Some(location);
        node
    }

    /// A copy carrying `location` when present, otherwise an unchanged copy.
    pub fn try_with_location(&self, location: Option<&Location>) -> GmodNode {
        match location {
            Some(location) => self.with_location(location.clone()),
            None => self.clone(),
        }
    }

    /// A copy with any location cleared.
    pub fn without_location(&self) -> GmodNode {
        let mut node = self.clone();
        node.location = None;
        node
    }

    // ------------------------------------------------------------------------
    // Classification (metadata only)
    // ------------------------------------------------------------------------

    pub fn is_product_selection(&self) -> bool {
        Gmod::is_product_selection(&self.metadata)
    }

    pub fn is_product_type(&self) -> bool {
        Gmod::is_product_type(&self.metadata)
    }

    pub fn is_asset(&self) -> bool {
        Gmod::is_asset(&self.metadata)
    }

    pub fn is_leaf_node(&self) -> bool {
        Gmod::is_leaf_node(&self.metadata)
    }

    pub fn is_function_node(&self) -> bool {
        Gmod::is_function_node(&self.metadata)
    }

    pub fn is_asset_function_node(&self) -> bool {
        Gmod::is_asset_function_node(&self.metadata)
    }

    pub fn is_function_composition(&self) -> bool {
        (self.metadata.category() == super::CATEGORY_ASSET_FUNCTION
            || self.metadata.category() == super::CATEGORY_PRODUCT_FUNCTION)
            && self.metadata.node_type() == super::TYPE_COMPOSITION
    }

    pub fn is_root(&self) -> bool {
        self.code == "VE"
    }

    /// Whether this node may carry an individual location.
    ///
    /// Groups, selections, product types and asset types never can. Function
    /// compositions can only when their code ends in `i`, or in the context
    /// of a set or as the path target.
    pub fn is_individualizable(&self, is_target_node: bool, is_in_set: bool) -> bool {
        if self.metadata.node_type() == super::TYPE_GROUP {
            return false;
        }
        if self.metadata.node_type() == super::TYPE_SELECTION {
            return false;
        }
        if self.is_product_type() {
            return false;
        }
        if self.metadata.category() == super::CATEGORY_ASSET
            && self.metadata.node_type() == super::TYPE_TYPE
        {
            return false;
        }
        if self.is_function_composition() {
            return self.code.ends_with('i') || is_in_set || is_target_node;
        }
        true
    }

    // ------------------------------------------------------------------------
    // Classification (graph-dependent)
    // ------------------------------------------------------------------------

    /// The product type assigned to this function node, if its single child
    /// is a PRODUCT TYPE.
    pub fn product_type<'g>(&self, gmod: &'g Gmod) -> Option<&'g GmodNode> {
        let children = gmod.children(self.id);
        if children.len() != 1 {
            return None;
        }
        if !self.metadata.category().contains(super::KEYWORD_FUNCTION) {
            return None;
        }

        let child = gmod.node(children[0]);
        if child.metadata.category() != super::CATEGORY_PRODUCT {
            return None;
        }
        if child.metadata.node_type() != super::TYPE_TYPE {
            return None;
        }
        Some(child)
    }

    /// The product selection under this function node, if its single child
    /// is a PRODUCT-category SELECTION.
    pub fn product_selection<'g>(&self, gmod: &'g Gmod) -> Option<&'g GmodNode> {
        let children = gmod.children(self.id);
        if children.len() != 1 {
            return None;
        }
        if !self.metadata.category().contains(super::KEYWORD_FUNCTION) {
            return None;
        }

        let child = gmod.node(children[0]);
        if !child.metadata.category().contains(super::KEYWORD_PRODUCT) {
            return None;
        }
        if child.metadata.node_type() != super::TYPE_SELECTION {
            return None;
        }
        Some(child)
    }

    /// Whether a local data channel may map onto this node.
    pub fn is_mappable(&self, gmod: &Gmod) -> bool {
        if self.product_type(gmod).is_some() {
            return false;
        }
        if self.product_selection(gmod).is_some() {
            return false;
        }
        if self.is_product_selection() {
            return false;
        }
        if self.is_asset() {
            return false;
        }

        !self.code.ends_with('a') && !self.code.ends_with('s')
    }

    // ------------------------------------------------------------------------
    // Relationship queries
    // ------------------------------------------------------------------------

    pub fn is_child(&self, gmod: &Gmod, code: &str) -> bool {
        gmod.is_child(self.id, code)
    }
}

impl PartialEq for GmodNode {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.location == other.location
    }
}

impl Eq for GmodNode {}

impl std::hash::Hash for GmodNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        if let Some(location) = &self.location {
            location.value().hash(state);
        }
    }
}

impl std::fmt::Display for GmodNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}-{}", self.code, location),
            None => write!(f, "{}", self.code),
        }
    }
}
