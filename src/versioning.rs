//! Cross-version conversion of nodes, paths and local ids.
//!
//! Each VIS release ships a rule table describing how codes of the previous
//! release map forward. Conversion always walks adjacent version pairs; a
//! jump over several releases is the composition of the single steps.
//!
//! Path conversion is the hard part: a renamed node may have moved elsewhere
//! in the tree, so the converted positions are re-linked by probing the
//! target graph with `path_exists_between` and splicing in the bridge nodes.

use std::collections::{HashMap, HashSet};

use crate::dto::GmodVersioningDto;
use crate::gmod::{path_exists_between, Gmod, GmodNode, GmodPath};
use crate::local_id::LocalIdBuilder;
use crate::vis::Vis;
use crate::vis_version::VisVersion;
use crate::{Error, Result};

/// The operation kinds a conversion rule may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionType {
    ChangeCode,
    Merge,
    Move,
    AssignmentChange,
    AssignmentDelete,
}

impl ConversionType {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "changeCode" => Ok(ConversionType::ChangeCode),
            "merge" => Ok(ConversionType::Merge),
            "move" => Ok(ConversionType::Move),
            "assignmentChange" => Ok(ConversionType::AssignmentChange),
            "assignmentDelete" => Ok(ConversionType::AssignmentDelete),
            other => Err(Error::Decode(format!("invalid conversion type: {other}"))),
        }
    }
}

/// One source code's conversion rule.
#[derive(Debug, Clone)]
pub struct GmodNodeConversion {
    pub operations: HashSet<ConversionType>,
    pub source: String,
    pub target: Option<String>,
    pub old_assignment: Option<String>,
    pub new_assignment: Option<String>,
    pub delete_assignment: bool,
}

/// The rule table mapping codes of the previous release into one target
/// release.
#[derive(Debug, Clone)]
struct GmodVersioningNode {
    changes: HashMap<String, GmodNodeConversion>,
}

impl GmodVersioningNode {
    fn new(dto_items: &HashMap<String, crate::dto::GmodNodeConversionDto>) -> Result<Self> {
        let mut changes = HashMap::with_capacity(dto_items.len());

        for (code, dto) in dto_items {
            let mut operations = HashSet::new();
            for operation in &dto.operations {
                operations.insert(ConversionType::parse(operation)?);
            }

            let non_empty = |value: &String| (!value.is_empty()).then(|| value.clone());
            changes.insert(
                code.clone(),
                GmodNodeConversion {
                    operations,
                    source: dto.source.clone(),
                    target: non_empty(&dto.target),
                    old_assignment: non_empty(&dto.old_assignment),
                    new_assignment: non_empty(&dto.new_assignment),
                    delete_assignment: dto.delete_assignment,
                },
            );
        }

        Ok(Self { changes })
    }
}

/// Converter across all released versions. Immutable once built.
#[derive(Debug, Clone)]
pub struct GmodVersioning {
    versionings: HashMap<VisVersion, GmodVersioningNode>,
}

impl GmodVersioning {
    /// Build from the versioning resource: a map of target-version strings to
    /// their rule tables.
    pub fn new(dto: &HashMap<String, GmodVersioningDto>) -> Result<Self> {
        let mut versionings = HashMap::with_capacity(dto.len());
        for (version_str, versioning_dto) in dto {
            let version = VisVersion::parse(version_str)?;
            versionings.insert(version, GmodVersioningNode::new(&versioning_dto.items)?);
        }
        Ok(Self { versionings })
    }

    // ------------------------------------------------------------------------
    // Node conversion
    // ------------------------------------------------------------------------

    /// Convert a node between versions. `Ok(None)` when the source version is
    /// not strictly older or the code has no counterpart in the target.
    pub fn convert_node(
        &self,
        vis: &Vis,
        source_version: VisVersion,
        node: &GmodNode,
        target_version: VisVersion,
    ) -> Result<Option<GmodNode>> {
        if node.code().is_empty() {
            return Ok(None);
        }
        if source_version >= target_version {
            return Ok(None);
        }

        let mut current = node.clone();
        let mut version = source_version;

        while version != target_version {
            let Some(next_version) = version.next() else {
                return Ok(None);
            };
            match self.convert_node_internal(vis, &current, next_version)? {
                Some(converted) => current = converted,
                None => return Ok(None),
            }
            version = next_version;
        }

        Ok(Some(current))
    }

    /// One adjacent step: apply the rename rule (if any) and resolve the
    /// result in the next release's graph, preserving the location.
    fn convert_node_internal(
        &self,
        vis: &Vis,
        source_node: &GmodNode,
        target_version: VisVersion,
    ) -> Result<Option<GmodNode>> {
        if source_node.vis_version() >= target_version {
            return Ok(None);
        }

        let source_code = source_node.code();
        let target_code = self
            .versionings
            .get(&target_version)
            .and_then(|versioning| versioning.changes.get(source_code))
            .and_then(|change| change.target.as_deref())
            .unwrap_or(source_code);

        let target_gmod = vis.gmod(target_version)?;
        let Some(target_node) = target_gmod.try_get_node(target_code) else {
            return Ok(None);
        };

        Ok(Some(target_node.try_with_location(source_node.location())))
    }

    // ------------------------------------------------------------------------
    // Path conversion
    // ------------------------------------------------------------------------

    /// Convert a whole path between versions.
    ///
    /// Positions convert independently first; when the converted chain is no
    /// longer a valid path, it is rebuilt incrementally by bridging over the
    /// target graph.
    pub fn convert_path(
        &self,
        vis: &Vis,
        source_version: VisVersion,
        source_path: &GmodPath,
        target_version: VisVersion,
    ) -> Result<Option<GmodPath>> {
        if source_version >= target_version {
            return Ok(None);
        }

        let Some(target_end_node) =
            self.convert_node(vis, source_version, source_path.node(), target_version)?
        else {
            return Ok(None);
        };

        let target_gmod = vis.gmod(target_version)?;
        if target_end_node.is_root() {
            let root = target_gmod.root_node().clone();
            return Ok(Some(GmodPath::new(target_gmod.clone(), Vec::new(), root)?));
        }

        let source_gmod = vis.gmod(source_version)?;

        let mut qualifying_nodes: Vec<(GmodNode, GmodNode)> =
            Vec::with_capacity(source_path.length());
        for (_, original) in source_path.iter() {
            let Some(converted) =
                self.convert_node(vis, source_version, original, target_version)?
            else {
                return Ok(None);
            };
            qualifying_nodes.push((original.clone(), converted));
        }

        // Fast path: the independently converted chain is already valid.
        let potential_parents: Vec<GmodNode> = qualifying_nodes
            [..qualifying_nodes.len() - 1]
            .iter()
            .map(|(_, converted)| converted.clone())
            .collect();
        if GmodPath::is_valid(&target_gmod, &potential_parents, &target_end_node) {
            return Ok(Some(GmodPath::new(
                target_gmod.clone(),
                potential_parents,
                target_end_node,
            )?));
        }

        let mut path: Vec<GmodNode> = Vec::new();

        let mut i = 0;
        while i < qualifying_nodes.len() {
            let (source_node, target_node) = &qualifying_nodes[i];
            if i > 0 && target_node.code() == qualifying_nodes[i - 1].1.code() {
                i += 1;
                continue;
            }

            let code_changed = source_node.code() != target_node.code();

            let source_normal_assignment = source_node.product_type(&source_gmod);
            let target_normal_assignment = target_node.product_type(&target_gmod);
            let normal_assignment_changed = match (source_normal_assignment, target_normal_assignment)
            {
                (Some(source_na), Some(target_na)) => source_na.code() != target_na.code(),
                (Some(_), None) | (None, Some(_)) => true,
                (None, None) => false,
            };

            if code_changed {
                add_to_path(&target_gmod, &mut path, target_node.clone())?;
            } else if normal_assignment_changed {
                // AC / AN / AD
                let was_deleted =
                    source_normal_assignment.is_some() && target_normal_assignment.is_none();

                add_to_path(&target_gmod, &mut path, target_node.clone())?;

                if was_deleted {
                    if target_node.code() == target_end_node.code() {
                        if let Some(next) = qualifying_nodes.get(i + 1) {
                            if next.1.code() != target_node.code() {
                                return Err(Error::Conversion(
                                    "normal assignment end node was deleted".to_string(),
                                ));
                            }
                        }
                    }
                    i += 1;
                    continue;
                }

                if target_node.code() != target_end_node.code() {
                    if let Some(new_assignment) = target_normal_assignment {
                        add_to_path(&target_gmod, &mut path, new_assignment.clone())?;
                        i += 1;
                    }
                }
            }

            // SC / SN / SD are reserved; no selection changes exist in the
            // versioning data.

            if !code_changed && !normal_assignment_changed {
                add_to_path(&target_gmod, &mut path, target_node.clone())?;
            }

            if path.last().map_or(false, |last| last.code() == target_end_node.code()) {
                break;
            }
            i += 1;
        }

        if path.is_empty() {
            return Ok(None);
        }

        let end_node = path.pop().expect("path is non-empty");
        let parents = path;

        if !GmodPath::is_valid(&target_gmod, &parents, &end_node) {
            return Err(Error::Conversion(format!(
                "didn't end up with valid path for {source_path}"
            )));
        }

        Ok(Some(GmodPath::new(target_gmod.clone(), parents, end_node)?))
    }

    // ------------------------------------------------------------------------
    // Local id conversion
    // ------------------------------------------------------------------------

    /// Convert a local id builder: both items convert via [`convert_path`];
    /// verbose mode and metadata tags carry over unchanged.
    pub fn convert_local_id(
        &self,
        vis: &Vis,
        source: &LocalIdBuilder,
        target_version: VisVersion,
    ) -> Result<Option<LocalIdBuilder>> {
        let Some(source_version) = source.vis_version() else {
            return Err(Error::InvalidInput(
                "cannot convert local id without a specific VIS version".to_string(),
            ));
        };

        let primary_item = match source.primary_item() {
            Some(path) => {
                match self.convert_path(vis, source_version, path, target_version)? {
                    Some(converted) => Some(converted),
                    None => return Ok(None),
                }
            }
            None => None,
        };

        let secondary_item = match source.secondary_item() {
            Some(path) => {
                match self.convert_path(vis, source_version, path, target_version)? {
                    Some(converted) => Some(converted),
                    None => return Ok(None),
                }
            }
            None => None,
        };

        Ok(Some(
            LocalIdBuilder::create(target_version)
                .try_with_primary_item(primary_item)
                .try_with_secondary_item(secondary_item)
                .with_verbose_mode(source.is_verbose_mode())
                .with_metadata_from(source),
        ))
    }
}

/// Append `node` to the path under construction, bridging or backtracking
/// when the previous tail is not its parent.
fn add_to_path(gmod: &std::sync::Arc<Gmod>, path: &mut Vec<GmodNode>, node: GmodNode) -> Result<()> {
    if let Some(prev) = path.last() {
        if !gmod.is_child(prev.id(), node.code()) {
            for j in (0..path.len()).rev() {
                let parent_code = path[j].code().to_string();
                let current_parents: Vec<GmodNode> = path[..=j].to_vec();

                let (exists, remaining) = path_exists_between(gmod, &current_parents, &node)?;
                if !exists {
                    let has_other_asset_function = current_parents
                        .iter()
                        .any(|p| p.is_asset_function_node() && p.code() != parent_code);
                    if !has_other_asset_function {
                        return Err(Error::Conversion(
                            "tried to remove last asset function node".to_string(),
                        ));
                    }
                    path.remove(j);
                } else {
                    let bridge: Vec<GmodNode> = match node.location() {
                        Some(location) => remaining
                            .iter()
                            .map(|n| {
                                if n.is_individualizable(false, true) {
                                    n.with_location(location.clone())
                                } else {
                                    (*n).clone()
                                }
                            })
                            .collect(),
                        None => remaining.iter().map(|&n| n.clone()).collect(),
                    };
                    path.extend(bridge);
                    break;
                }
            }
        }
    }

    path.push(node);
    Ok(())
}
