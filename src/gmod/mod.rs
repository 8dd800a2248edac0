//! # Generic Product Model
//!
//! The GMOD is a directed graph of taxonomy nodes: functions, products and
//! assets, wired parent-to-child. Node records live in a flat arena; a
//! perfect-hash dictionary maps codes to arena ids; adjacency is stored on
//! the graph, not in the nodes.
//!
//! Submodules: `node` (records), `traversal` (occurrence-bounded DFS),
//! `path` (the path model) and `parse` (path parsing).

pub mod node;
pub mod parse;
pub mod path;
pub mod traversal;

pub use node::{GmodNode, GmodNodeMetadata, NodeId};
pub use path::{GmodIndividualizableSet, GmodPath};
pub use traversal::{
    path_exists_between, Parents, TraversalHandlerResult, TraversalOptions,
    DEFAULT_MAX_TRAVERSAL_OCCURRENCE,
};

use std::collections::HashSet;

use crate::chd::ChdDictionary;
use crate::dto::GmodDto;
use crate::vis_version::VisVersion;
use crate::{Error, Result};

// ============================================================================
// Category / type vocabulary
// ============================================================================

pub(crate) const CATEGORY_PRODUCT: &str = "PRODUCT";
pub(crate) const CATEGORY_ASSET: &str = "ASSET";
pub(crate) const CATEGORY_ASSET_FUNCTION: &str = "ASSET FUNCTION";
pub(crate) const CATEGORY_PRODUCT_FUNCTION: &str = "PRODUCT FUNCTION";

pub(crate) const TYPE_SELECTION: &str = "SELECTION";
pub(crate) const TYPE_GROUP: &str = "GROUP";
pub(crate) const TYPE_LEAF: &str = "LEAF";
pub(crate) const TYPE_TYPE: &str = "TYPE";
pub(crate) const TYPE_COMPOSITION: &str = "COMPOSITION";

pub(crate) const KEYWORD_FUNCTION: &str = "FUNCTION";
pub(crate) const KEYWORD_PRODUCT: &str = "PRODUCT";

const FULLTYPE_ASSET_FUNCTION_LEAF: &str = "ASSET FUNCTION LEAF";
const FULLTYPE_PRODUCT_FUNCTION_LEAF: &str = "PRODUCT FUNCTION LEAF";

// ============================================================================
// Gmod
// ============================================================================

/// The taxonomy graph of one VIS release. Immutable once built.
#[derive(Debug, Clone)]
pub struct Gmod {
    vis_version: VisVersion,
    /// Node arena; `NodeId` indexes into it.
    nodes: Vec<GmodNode>,
    /// Perfect-hash index `code -> NodeId`.
    index: ChdDictionary<NodeId>,
    /// Children per node, in declared relation order.
    children: Vec<Vec<NodeId>>,
    /// Parents per node; a node may appear under several parents.
    parents: Vec<Vec<NodeId>>,
    /// Child code membership per node.
    children_sets: Vec<HashSet<String>>,
    root: NodeId,
}

impl Gmod {
    /// Build the graph from a decoded taxonomy DTO.
    ///
    /// Relations whose parent or child code is unknown are ignored; duplicate
    /// child entries under the same parent are ignored.
    pub fn new(vis_version: VisVersion, dto: &GmodDto) -> Result<Self> {
        let nodes: Vec<GmodNode> = dto
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| GmodNode::new(NodeId(i as u32), vis_version, item))
            .collect();

        let index = ChdDictionary::new(
            nodes
                .iter()
                .map(|node| (node.code().to_string(), node.id()))
                .collect(),
        )?;

        let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
        let mut parents: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
        let mut children_sets: Vec<HashSet<String>> = vec![HashSet::new(); nodes.len()];

        for relation in &dto.relations {
            if relation.len() < 2 {
                continue;
            }
            let (Some(&parent), Some(&child)) = (
                index.try_get(&relation[0]),
                index.try_get(&relation[1]),
            ) else {
                continue;
            };

            if !children_sets[parent.0 as usize].insert(nodes[child.0 as usize].code().to_string())
            {
                continue;
            }
            children[parent.0 as usize].push(child);
            parents[child.0 as usize].push(parent);
        }

        for list in children.iter_mut().chain(parents.iter_mut()) {
            list.shrink_to_fit();
        }

        let root = *index
            .try_get("VE")
            .ok_or_else(|| Error::Decode("root node 'VE' not found in GMOD".to_string()))?;

        Ok(Self {
            vis_version,
            nodes,
            index,
            children,
            parents,
            children_sets,
            root,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn root_node(&self) -> &GmodNode {
        &self.nodes[self.root.0 as usize]
    }

    /// The node record behind an id. Ids handed out by this graph are always
    /// in bounds.
    pub fn node(&self, id: NodeId) -> &GmodNode {
        &self.nodes[id.0 as usize]
    }

    pub fn try_get_node(&self, code: &str) -> Option<&GmodNode> {
        self.index.try_get(code).map(|&id| self.node(id))
    }

    pub fn get(&self, code: &str) -> Result<&GmodNode> {
        self.index.get(code).map(|&id| self.node(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate all nodes in the index's slot order. Stable per release.
    pub fn iter(&self) -> impl Iterator<Item = &GmodNode> {
        self.index.iter().map(|(_, &id)| self.node(id))
    }

    // ------------------------------------------------------------------------
    // Adjacency
    // ------------------------------------------------------------------------

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.0 as usize]
    }

    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        &self.parents[id.0 as usize]
    }

    pub fn is_child(&self, parent: NodeId, code: &str) -> bool {
        self.children_sets[parent.0 as usize].contains(code)
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    /// Depth-first traversal from the root with default options. Returns
    /// `true` iff the traversal completed without a `Stop` verdict.
    pub fn traverse<S, H>(&self, state: &mut S, handler: H) -> bool
    where
        H: FnMut(&mut S, &Parents<'_>, &GmodNode) -> TraversalHandlerResult,
    {
        traversal::traverse_from(self, self.root_node(), state, handler, &TraversalOptions::default())
    }

    pub fn traverse_with<S, H>(
        &self,
        options: &TraversalOptions,
        state: &mut S,
        handler: H,
    ) -> bool
    where
        H: FnMut(&mut S, &Parents<'_>, &GmodNode) -> TraversalHandlerResult,
    {
        traversal::traverse_from(self, self.root_node(), state, handler, options)
    }

    /// Depth-first traversal from an arbitrary start node.
    pub fn traverse_from<S, H>(&self, start: &GmodNode, state: &mut S, handler: H) -> bool
    where
        H: FnMut(&mut S, &Parents<'_>, &GmodNode) -> TraversalHandlerResult,
    {
        traversal::traverse_from(self, self.node(start.id()), state, handler, &TraversalOptions::default())
    }

    // ------------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------------

    /// Types that bound individualizable sets during path validation.
    pub fn is_potential_parent(node_type: &str) -> bool {
        node_type == TYPE_SELECTION || node_type == TYPE_GROUP || node_type == TYPE_LEAF
    }

    pub fn is_leaf_node(metadata: &GmodNodeMetadata) -> bool {
        let full_type = metadata.full_type();
        full_type == FULLTYPE_ASSET_FUNCTION_LEAF || full_type == FULLTYPE_PRODUCT_FUNCTION_LEAF
    }

    pub fn is_function_node(metadata: &GmodNodeMetadata) -> bool {
        let category = metadata.category();
        category != CATEGORY_PRODUCT && category != CATEGORY_ASSET
    }

    pub fn is_product_selection(metadata: &GmodNodeMetadata) -> bool {
        metadata.category() == CATEGORY_PRODUCT && metadata.node_type() == TYPE_SELECTION
    }

    pub fn is_product_type(metadata: &GmodNodeMetadata) -> bool {
        metadata.category() == CATEGORY_PRODUCT && metadata.node_type() == TYPE_TYPE
    }

    pub fn is_asset(metadata: &GmodNodeMetadata) -> bool {
        metadata.category() == CATEGORY_ASSET
    }

    pub fn is_asset_function_node(metadata: &GmodNodeMetadata) -> bool {
        metadata.category() == CATEGORY_ASSET_FUNCTION
    }

    /// FUNCTION-category parent assigning a PRODUCT TYPE child.
    pub fn is_product_type_assignment(parent: Option<&GmodNode>, child: Option<&GmodNode>) -> bool {
        let (Some(parent), Some(child)) = (parent, child) else {
            return false;
        };
        if !parent.metadata().category().contains(KEYWORD_FUNCTION) {
            return false;
        }
        child.metadata().category() == CATEGORY_PRODUCT && child.metadata().node_type() == TYPE_TYPE
    }

    /// FUNCTION-category parent assigning a PRODUCT-category SELECTION child.
    pub fn is_product_selection_assignment(
        parent: Option<&GmodNode>,
        child: Option<&GmodNode>,
    ) -> bool {
        let (Some(parent), Some(child)) = (parent, child) else {
            return false;
        };
        if !parent.metadata().category().contains(KEYWORD_FUNCTION) {
            return false;
        }
        child.metadata().category().contains(KEYWORD_PRODUCT)
            && child.metadata().node_type() == TYPE_SELECTION
    }
}
