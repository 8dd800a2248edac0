//! GMOD paths.
//!
//! A path addresses one piece of equipment by walking the taxonomy from the
//! root to a target node. Positions are owned node values, so a path can
//! decorate any of them with a location without touching the shared graph.
//! Which positions may be decorated — and which must share one location — is
//! governed by the individualizable-set rules implemented here.

use std::sync::Arc;

use crate::locations::Location;
use crate::vis_version::VisVersion;
use crate::{Error, Result};

use super::{Gmod, GmodNode};

// ============================================================================
// Location-set detection
// ============================================================================

/// Streaming detector for individualizable sets.
///
/// Feed every position of a path in order; a returned `(start, end, location)`
/// triple describes a completed set. Potential-parent nodes (SELECTION, GROUP,
/// LEAF types) and the target bound the candidate ranges.
pub(crate) struct LocationSetsVisitor {
    current_parent_start: Option<usize>,
}

impl LocationSetsVisitor {
    pub(crate) fn new() -> Self {
        Self { current_parent_start: None }
    }

    pub(crate) fn visit(
        &mut self,
        node: &GmodNode,
        i: usize,
        parents: &[GmodNode],
        target: &GmodNode,
    ) -> Result<Option<(usize, usize, Option<Location>)>> {
        let position = |j: usize| -> &GmodNode {
            if j < parents.len() {
                &parents[j]
            } else {
                target
            }
        };

        let is_parent = Gmod::is_potential_parent(node.metadata().node_type());
        let is_target_node = i == parents.len();

        let Some(parent_start) = self.current_parent_start else {
            if is_parent {
                self.current_parent_start = Some(i);
            }
            if node.is_individualizable(is_target_node, false) {
                return Ok(Some((i, i, node.location().cloned())));
            }
            return Ok(None);
        };

        if is_parent || is_target_node {
            let mut nodes: Option<(usize, usize, Option<Location>)> = None;

            if parent_start + 1 == i {
                if node.is_individualizable(is_target_node, false) {
                    nodes = Some((i, i, node.location().cloned()));
                }
            } else {
                let mut skipped_one: Option<usize> = None;
                let mut has_composition = false;

                for j in (parent_start + 1)..=i {
                    let set_node = position(j);

                    if !set_node.is_individualizable(j == parents.len(), true) {
                        if nodes.is_some() {
                            skipped_one = Some(j);
                        }
                        continue;
                    }

                    if let Some((_, _, Some(set_location))) = &nodes {
                        if let Some(node_location) = set_node.location() {
                            if set_location != node_location {
                                return Err(Error::InvalidPath(
                                    "mapping error: different locations in the same nodeset"
                                        .to_string(),
                                ));
                            }
                        }
                    }

                    if skipped_one.is_some() {
                        return Err(Error::InvalidPath(
                            "can't skip in the middle of individualizable set".to_string(),
                        ));
                    }

                    if set_node.is_function_composition() {
                        has_composition = true;
                    }

                    let location = match &nodes {
                        Some((_, _, Some(location))) => Some(location.clone()),
                        _ => set_node.location().cloned(),
                    };
                    let start = nodes.as_ref().map(|&(start, _, _)| start).unwrap_or(j);
                    nodes = Some((start, j, location));
                }

                // A single composition node is not a set on its own.
                if has_composition && matches!(&nodes, Some((start, end, _)) if start == end) {
                    nodes = None;
                }
            }

            self.current_parent_start = Some(i);
            if let Some(set) = nodes {
                let has_leaf_or_target =
                    (set.0..=set.1).any(|j| position(j).is_leaf_node() || j == parents.len());
                if has_leaf_or_target {
                    return Ok(Some(set));
                }
            }
        }

        if is_target_node && node.is_individualizable(is_target_node, false) {
            return Ok(Some((i, i, node.location().cloned())));
        }

        Ok(None)
    }
}

// ============================================================================
// GmodPath
// ============================================================================

/// A rooted path through the taxonomy, ending at its target node.
///
/// `parents[0]` is always the GMOD root; every consecutive pair is a
/// parent/child edge. Length counts the target, so it is `parents.len() + 1`.
#[derive(Debug, Clone)]
pub struct GmodPath {
    pub(crate) gmod: Arc<Gmod>,
    pub(crate) parents: Vec<GmodNode>,
    pub(crate) node: GmodNode,
    vis_version: VisVersion,
}

impl GmodPath {
    /// Validate and build a path. Fails with [`Error::InvalidPath`] when the
    /// chain is not rooted, an edge is missing, or the location-set rules are
    /// violated.
    pub fn new(gmod: Arc<Gmod>, parents: Vec<GmodNode>, node: GmodNode) -> Result<Self> {
        if parents.is_empty() {
            if !node.is_root() {
                return Err(Error::InvalidPath(format!(
                    "no parents, and node '{}' is not the GMOD root '{}'",
                    node.code(),
                    gmod.root_node().code()
                )));
            }
        } else {
            if !parents[0].is_root() {
                return Err(Error::InvalidPath(format!(
                    "first parent '{}' should be GMOD root '{}'",
                    parents[0].code(),
                    gmod.root_node().code()
                )));
            }

            for i in 0..parents.len() {
                let child = if i + 1 < parents.len() { &parents[i + 1] } else { &node };
                if !gmod.is_child(parents[i].id(), child.code()) {
                    return Err(Error::InvalidPath(format!(
                        "node '{}' not child of '{}'",
                        child.code(),
                        parents[i].code()
                    )));
                }
            }
        }

        let mut visitor = LocationSetsVisitor::new();
        for i in 0..=parents.len() {
            let position = if i < parents.len() { &parents[i] } else { &node };
            visitor.visit(position, i, &parents, &node)?;
        }

        let vis_version = node.vis_version();
        Ok(Self { gmod, parents, node, vis_version })
    }

    pub(crate) fn new_unchecked(gmod: Arc<Gmod>, parents: Vec<GmodNode>, node: GmodNode) -> Self {
        let vis_version = node.vis_version();
        Self { gmod, parents, node, vis_version }
    }

    /// Whether `parents + node` forms a rooted parent/child chain.
    pub fn is_valid(gmod: &Gmod, parents: &[GmodNode], node: &GmodNode) -> bool {
        Self::is_valid_with_missing_link(gmod, parents, node).is_ok()
    }

    /// As [`is_valid`], reporting the index of the first broken link.
    pub(crate) fn is_valid_with_missing_link(
        gmod: &Gmod,
        parents: &[GmodNode],
        node: &GmodNode,
    ) -> std::result::Result<(), Option<usize>> {
        if parents.is_empty() {
            return Err(None);
        }
        if !parents[0].is_root() {
            return Err(None);
        }

        for i in 0..parents.len() {
            let child = if i + 1 < parents.len() { &parents[i + 1] } else { node };
            if !gmod.is_child(parents[i].id(), child.code()) {
                return Err(Some(i));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn gmod(&self) -> &Gmod {
        &self.gmod
    }

    /// The target node.
    pub fn node(&self) -> &GmodNode {
        &self.node
    }

    pub fn parents(&self) -> &[GmodNode] {
        &self.parents
    }

    /// Number of positions, target included.
    pub fn length(&self) -> usize {
        self.parents.len() + 1
    }

    pub fn root_node(&self) -> &GmodNode {
        self.parents.first().unwrap_or(&self.node)
    }

    /// The immediate parent of the target, if any.
    pub fn parent_node(&self) -> Option<&GmodNode> {
        self.parents.last()
    }

    pub fn get(&self, depth: usize) -> Option<&GmodNode> {
        if depth < self.parents.len() {
            self.parents.get(depth)
        } else if depth == self.parents.len() {
            Some(&self.node)
        } else {
            None
        }
    }

    /// Iterate `(depth, node)` from the root to the target.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &GmodNode)> {
        self.parents
            .iter()
            .chain(std::iter::once(&self.node))
            .enumerate()
    }

    // ------------------------------------------------------------------------
    // Individualization
    // ------------------------------------------------------------------------

    /// The individualizable sets of this path, in position order. Each set
    /// owns a copy of the path; mutate it via
    /// [`GmodIndividualizableSet::set_location`] and take the result with
    /// [`GmodIndividualizableSet::build`].
    pub fn individualizable_sets(&self) -> Result<Vec<GmodIndividualizableSet>> {
        let mut visitor = LocationSetsVisitor::new();
        let mut result = Vec::new();

        for i in 0..self.length() {
            let node = self.get(i).expect("depth within length");
            let Some((start, end, _)) = visitor.visit(node, i, &self.parents, &self.node)? else {
                continue;
            };
            let indices: Vec<usize> = (start..=end).collect();
            result.push(GmodIndividualizableSet::new(indices, self.clone())?);
        }

        Ok(result)
    }

    pub fn is_mappable(&self) -> bool {
        self.node.is_mappable(&self.gmod)
    }

    /// A copy with every location cleared.
    pub fn without_locations(&self) -> GmodPath {
        GmodPath {
            gmod: self.gmod.clone(),
            parents: self.parents.iter().map(GmodNode::without_location).collect(),
            node: self.node.without_location(),
            vis_version: self.vis_version,
        }
    }

    // ------------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------------

    /// The normal-assignment display name applying to the node at `depth`,
    /// resolved against the deepest matching descendant in this path.
    pub fn normal_assignment_name(&self, depth: usize) -> Option<&str> {
        let node = self.get(depth)?;
        let assignments = node.metadata().normal_assignment_names();
        if assignments.is_empty() {
            return None;
        }

        for i in (depth..self.length()).rev() {
            let descendant = self.get(i).expect("depth within length");
            if let Some(name) = assignments.get(descendant.code()) {
                return Some(name);
            }
        }
        None
    }

    /// `(depth, display name)` for every function node that is a leaf or the
    /// target, with normal-assignment overrides applied.
    pub fn common_names(&self) -> Vec<(usize, String)> {
        let mut result = Vec::new();

        for (depth, node) in self.iter() {
            let is_target = depth == self.parents.len();
            if !(node.is_leaf_node() || is_target) || !node.is_function_node() {
                continue;
            }

            let mut name = node
                .metadata()
                .common_name()
                .unwrap_or(node.metadata().name())
                .to_string();

            let assignments = node.metadata().normal_assignment_names();
            if !assignments.is_empty() {
                if let Some(assignment) = assignments.get(self.node.code()) {
                    name = assignment.clone();
                }
                for i in (depth..self.parents.len()).rev() {
                    if let Some(assignment) = assignments.get(self.parents[i].code()) {
                        name = assignment.clone();
                    }
                }
            }

            result.push((depth, name));
        }

        result
    }

    // ------------------------------------------------------------------------
    // String forms
    // ------------------------------------------------------------------------

    /// Short form: every leaf parent plus the target, `/`-separated.
    pub fn to_path_string(&self) -> String {
        let mut out = String::new();
        for parent in &self.parents {
            if !parent.is_leaf_node() {
                continue;
            }
            out.push_str(&parent.to_string());
            out.push('/');
        }
        out.push_str(&self.node.to_string());
        out
    }

    /// Full form: every position, `/`-separated.
    pub fn to_full_path_string(&self) -> String {
        let mut out = String::new();
        for (depth, node) in self.iter() {
            out.push_str(&node.to_string());
            if depth + 1 < self.length() {
                out.push('/');
            }
        }
        out
    }

    /// Diagnostic dump of depths >= 1:
    /// `code[/N:name][/CN:commonName][/NAN:normalAssignmentName]`, joined by
    /// `" | "`.
    pub fn to_string_dump(&self) -> String {
        let mut out = String::new();

        for (depth, node) in self.iter() {
            if depth == 0 {
                continue;
            }
            if depth > 1 {
                out.push_str(" | ");
            }

            out.push_str(node.code());

            let name = node.metadata().name();
            if !name.is_empty() {
                out.push_str("/N:");
                out.push_str(name);
            }
            if let Some(common_name) = node.metadata().common_name() {
                if !common_name.is_empty() {
                    out.push_str("/CN:");
                    out.push_str(common_name);
                }
            }
            if let Some(normal_assignment) = self.normal_assignment_name(depth) {
                if !normal_assignment.is_empty() {
                    out.push_str("/NAN:");
                    out.push_str(normal_assignment);
                }
            }
        }

        out
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    /// Parse a short-form path string for a VIS version, resolving resources
    /// through the process-wide [`crate::Vis`] instance.
    pub fn parse(item: &str, vis_version: VisVersion) -> Result<GmodPath> {
        let vis = crate::Vis::instance();
        let gmod = vis.gmod(vis_version)?;
        let locations = vis.locations(vis_version)?;
        super::parse::parse_path(item, &gmod, &locations)
    }

    /// Parse a short-form path string against explicit resources.
    pub fn parse_with(
        item: &str,
        gmod: &Arc<Gmod>,
        locations: &crate::locations::Locations,
    ) -> Result<GmodPath> {
        super::parse::parse_path(item, gmod, locations)
    }

    pub fn try_parse(item: &str, vis_version: VisVersion) -> Option<GmodPath> {
        Self::parse(item, vis_version).ok()
    }

    /// Parse a full-form path string for a VIS version.
    pub fn parse_full_path(item: &str, vis_version: VisVersion) -> Result<GmodPath> {
        let vis = crate::Vis::instance();
        let gmod = vis.gmod(vis_version)?;
        let locations = vis.locations(vis_version)?;
        super::parse::parse_full_path(item, &gmod, &locations)
    }

    /// Parse a full-form path string against explicit resources.
    pub fn parse_full_path_with(
        item: &str,
        gmod: &Arc<Gmod>,
        locations: &crate::locations::Locations,
    ) -> Result<GmodPath> {
        super::parse::parse_full_path(item, gmod, locations)
    }

    pub fn try_parse_full_path(item: &str, vis_version: VisVersion) -> Option<GmodPath> {
        Self::parse_full_path(item, vis_version).ok()
    }
}

impl std::ops::Index<usize> for GmodPath {
    type Output = GmodNode;

    fn index(&self, depth: usize) -> &GmodNode {
        self.get(depth)
            .unwrap_or_else(|| panic!("depth {depth} out of range for path length {}", self.length()))
    }
}

impl PartialEq for GmodPath {
    fn eq(&self, other: &Self) -> bool {
        self.vis_version == other.vis_version
            && self.parents == other.parents
            && self.node == other.node
    }
}

impl Eq for GmodPath {}

impl std::hash::Hash for GmodPath {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for (_, node) in self.iter() {
            node.hash(state);
        }
    }
}

impl std::fmt::Display for GmodPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

// ============================================================================
// GmodIndividualizableSet
// ============================================================================

/// A contiguous range of path positions that share one optional location.
///
/// The set owns a copy of its path; `set_location` rewrites the covered
/// positions and `build` hands the path back exactly once.
#[derive(Debug)]
pub struct GmodIndividualizableSet {
    node_indices: Vec<usize>,
    path: Option<GmodPath>,
}

impl GmodIndividualizableSet {
    pub(crate) fn new(node_indices: Vec<usize>, path: GmodPath) -> Result<Self> {
        if node_indices.is_empty() {
            return Err(Error::InvalidInput(
                "individualizable set cannot be empty".to_string(),
            ));
        }

        for &idx in &node_indices {
            let node = path.get(idx).ok_or_else(|| {
                Error::InvalidInput(format!("node index {idx} is out of bounds"))
            })?;

            let is_target = idx == path.length() - 1;
            let is_in_set = node_indices.len() > 1;
            if !node.is_individualizable(is_target, is_in_set) {
                return Err(Error::InvalidInput(format!(
                    "node '{}' is not individualizable",
                    node.code()
                )));
            }
        }

        if node_indices.len() > 1 {
            let expected = path[node_indices[0]].location();
            for &idx in &node_indices[1..] {
                if path[idx].location() != expected {
                    return Err(Error::InvalidInput(
                        "individualizable set nodes have different locations".to_string(),
                    ));
                }
            }
        }

        let part_of_short_path = node_indices
            .iter()
            .any(|&idx| idx == path.length() - 1 || path[idx].is_leaf_node());
        if !part_of_short_path {
            return Err(Error::InvalidInput(
                "individualizable set has no nodes that are part of short path".to_string(),
            ));
        }

        Ok(Self { node_indices, path: Some(path) })
    }

    pub fn node_indices(&self) -> &[usize] {
        &self.node_indices
    }

    pub fn nodes(&self) -> Vec<&GmodNode> {
        let Some(path) = self.path.as_ref() else {
            return Vec::new();
        };
        self.node_indices.iter().map(|&idx| &path[idx]).collect()
    }

    /// The set's current location (taken from its first position).
    pub fn location(&self) -> Option<&Location> {
        let path = self.path.as_ref()?;
        path[self.node_indices[0]].location()
    }

    /// Rewrite every covered position to carry `location` (or none).
    pub fn set_location(&mut self, location: Option<&Location>) {
        let Some(path) = self.path.as_mut() else {
            return;
        };

        for &idx in &self.node_indices {
            let node = if idx < path.parents.len() {
                &mut path.parents[idx]
            } else {
                &mut path.node
            };
            *node = match location {
                Some(location) => node.with_location(location.clone()),
                None => node.without_location(),
            };
        }
    }

    /// Consume the set and return the (possibly re-individualized) path.
    /// A second call is a [`Error::Usage`] error.
    pub fn build(&mut self) -> Result<GmodPath> {
        self.path
            .take()
            .ok_or_else(|| Error::Usage("individualizable set has already been built".to_string()))
    }
}

impl std::fmt::Display for GmodIndividualizableSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let mut first = true;
        for (j, &idx) in self.node_indices.iter().enumerate() {
            let node = &path[idx];
            if node.is_leaf_node() || j == self.node_indices.len() - 1 {
                if !first {
                    write!(f, "/")?;
                }
                write!(f, "{node}")?;
                first = false;
            }
        }
        Ok(())
    }
}
