//! Path parsing: short form and full form.
//!
//! The short form (`411.1/C101.31-2`) names only leaf parents and the
//! target, so parsing searches the graph for the one subtree walk that
//! visits every named part in order. The full form names every position and
//! parses by direct validation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::locations::{Location, Locations};
use crate::{Error, Result};

use super::path::LocationSetsVisitor;
use super::{Gmod, GmodNode, GmodPath, TraversalHandlerResult};

/// One `code[-location]` segment of a path string.
struct PathNode {
    code: String,
    location: Option<Location>,
}

fn split_segment(
    segment: &str,
    gmod: &Gmod,
    locations: &Locations,
) -> Result<PathNode> {
    let (code, location_str) = match segment.split_once('-') {
        Some((code, location_str)) => (code, Some(location_str)),
        None => (segment, None),
    };

    if gmod.try_get_node(code).is_none() {
        return Err(Error::Parse(format!("failed to get GmodNode for {segment}")));
    }

    let location = match location_str {
        Some(location_str) => Some(locations.try_parse(location_str).ok_or_else(|| {
            Error::Parse(format!("failed to parse location {location_str}"))
        })?),
        None => None,
    };

    Ok(PathNode { code: code.to_string(), location })
}

fn normalize(item: &str) -> &str {
    let item = item.trim();
    item.strip_prefix('/').unwrap_or(item)
}

// ============================================================================
// Short form
// ============================================================================

struct ParseContext {
    parts: VecDeque<PathNode>,
    to_find: PathNode,
    node_locations: HashMap<String, Location>,
    path: Option<GmodPath>,
    error: Option<Error>,
}

pub(crate) fn parse_path(item: &str, gmod: &Arc<Gmod>, locations: &Locations) -> Result<GmodPath> {
    if gmod.vis_version() != locations.vis_version() {
        return Err(Error::InvalidInput(
            "got different VIS versions for Gmod and Locations arguments".to_string(),
        ));
    }

    let item = normalize(item);
    if item.is_empty() {
        return Err(Error::Parse("item is empty".to_string()));
    }

    let mut parts: VecDeque<PathNode> = VecDeque::new();
    for segment in item.split('/') {
        if segment.is_empty() {
            return Err(Error::Parse("found part with empty code".to_string()));
        }
        parts.push_back(split_segment(segment, gmod, locations)?);
    }

    let to_find = parts.pop_front().expect("at least one part");
    let base_node = gmod.get(&to_find.code)?;

    let mut context = ParseContext {
        parts,
        to_find,
        node_locations: HashMap::new(),
        path: None,
        error: None,
    };

    let gmod_arc = gmod.clone();
    super::traversal::traverse_from(
        gmod,
        base_node,
        &mut context,
        |context, parents, node| handle_parse_node(&gmod_arc, context, parents.as_list(), node),
        &super::TraversalOptions::default(),
    );

    if let Some(error) = context.error.take() {
        return Err(error);
    }
    context
        .path
        .ok_or_else(|| Error::Parse(format!("failed to find path after traversal for item '{item}'")))
}

fn handle_parse_node(
    gmod: &Arc<Gmod>,
    context: &mut ParseContext,
    traversed_parents: &[&GmodNode],
    current: &GmodNode,
) -> TraversalHandlerResult {
    let found = current.code() == context.to_find.code;

    if !found && current.is_leaf_node() {
        return TraversalHandlerResult::SkipSubtree;
    }
    if !found {
        return TraversalHandlerResult::Continue;
    }

    if let Some(location) = &context.to_find.location {
        context
            .node_locations
            .insert(context.to_find.code.clone(), location.clone());
    }

    if let Some(next) = context.parts.pop_front() {
        context.to_find = next;
        return TraversalHandlerResult::Continue;
    }

    // Every queued part matched: reconstruct the absolute path.
    let with_recorded_location = |node: &GmodNode| -> GmodNode {
        match context.node_locations.get(node.code()) {
            Some(location) => node.with_location(location.clone()),
            None => node.clone(),
        }
    };

    let mut path_parents: Vec<GmodNode> =
        traversed_parents.iter().map(|&p| with_recorded_location(p)).collect();
    let end_node = with_recorded_location(current);

    // The matched subtree must hang off the root through single-parent links.
    let first_ancestor_of = |node: &GmodNode| -> Option<super::NodeId> {
        let node_parents = gmod.parents(node.id());
        (node_parents.len() == 1).then(|| node_parents[0])
    };
    let ancestor_id = match path_parents.first() {
        Some(first) => first_ancestor_of(first),
        None => first_ancestor_of(&end_node),
    };
    let Some(mut ancestor) = ancestor_id.map(|id| gmod.node(id)) else {
        return TraversalHandlerResult::Stop;
    };
    if gmod.parents(ancestor.id()).len() > 1 {
        return TraversalHandlerResult::Stop;
    }

    let mut prepended: Vec<GmodNode> = Vec::new();
    loop {
        let ancestor_parents = gmod.parents(ancestor.id());
        if ancestor_parents.len() != 1 {
            break;
        }
        prepended.push(with_recorded_location(ancestor));

        ancestor = gmod.node(ancestor_parents[0]);
        if gmod.parents(ancestor.id()).len() > 1 && !ancestor.is_root() {
            return TraversalHandlerResult::Stop;
        }
    }

    prepended.reverse();
    path_parents.splice(0..0, prepended);

    if path_parents.first().map_or(true, |first| !first.is_root()) {
        path_parents.insert(0, gmod.root_node().clone());
    }

    // Apply each closed set's common location across its span; anything
    // located outside every set invalidates the path.
    let mut visitor = LocationSetsVisitor::new();
    let mut end_node = end_node;
    for i in 0..=path_parents.len() {
        let node = if i < path_parents.len() { &path_parents[i] } else { &end_node };
        let set = match visitor.visit(node, i, &path_parents, &end_node) {
            Ok(set) => set,
            Err(error) => {
                context.error = Some(error);
                return TraversalHandlerResult::Stop;
            }
        };

        match set {
            Some((start, end, common_location)) => {
                if start == end {
                    continue;
                }
                if let Some(common_location) = common_location {
                    for k in start..=end {
                        let position = if k < path_parents.len() {
                            &mut path_parents[k]
                        } else {
                            &mut end_node
                        };
                        *position = position.with_location(common_location.clone());
                    }
                }
            }
            None => {
                if node.location().is_some() {
                    return TraversalHandlerResult::Stop;
                }
            }
        }
    }

    context.path = Some(GmodPath::new_unchecked(gmod.clone(), path_parents, end_node));
    TraversalHandlerResult::Stop
}

// ============================================================================
// Full form
// ============================================================================

const MAX_LOCATION_SETS: usize = 16;

pub(crate) fn parse_full_path(
    item: &str,
    gmod: &Arc<Gmod>,
    locations: &Locations,
) -> Result<GmodPath> {
    if gmod.vis_version() != locations.vis_version() {
        return Err(Error::InvalidInput(
            "got different VIS versions for Gmod and Locations arguments".to_string(),
        ));
    }

    let item = normalize(item);
    if item.is_empty() {
        return Err(Error::Parse("item is empty".to_string()));
    }

    let root_code = gmod.root_node().code();
    if !item.starts_with(root_code) {
        return Err(Error::Parse(format!("path must start with {root_code}")));
    }

    let mut nodes: Vec<GmodNode> = Vec::with_capacity(item.len() / 3);
    for segment in item.split('/') {
        if segment.is_empty() {
            return Err(Error::Parse("path contains an empty segment".to_string()));
        }

        let part = split_segment(segment, gmod, locations)?;
        let base = gmod.get(&part.code)?;
        nodes.push(base.try_with_location(part.location.as_ref()));
    }

    let mut end_node = nodes.pop().expect("at least one segment");
    let mut parents = nodes;

    if GmodPath::is_valid_with_missing_link(gmod, &parents, &end_node).is_err() {
        return Err(Error::Parse("sequence of nodes are invalid".to_string()));
    }

    // First pass: detect sets, spread each set's location over its span, and
    // reject locations stranded before a set boundary.
    let mut visitor = LocationSetsVisitor::new();
    let mut previous_located_idx: Option<usize> = None;
    let mut sets: Vec<(usize, usize)> = Vec::new();

    for i in 0..=parents.len() {
        let node = if i < parents.len() { &parents[i] } else { &end_node };
        let set = visitor.visit(node, i, &parents, &end_node)?;

        let Some((start, end, common_location)) = set else {
            if previous_located_idx.is_none() && node.location().is_some() {
                previous_located_idx = Some(i);
            }
            continue;
        };

        if let Some(previous) = previous_located_idx {
            for j in previous..start {
                let outside = if j < parents.len() { &parents[j] } else { &end_node };
                if outside.location().is_some() {
                    return Err(Error::Parse(format!(
                        "expected all nodes outside set to be without individualization, found {}",
                        outside.code()
                    )));
                }
            }
        }
        previous_located_idx = None;

        if sets.len() == MAX_LOCATION_SETS {
            return Err(Error::Parse(format!(
                "exceeded maximum of {MAX_LOCATION_SETS} location sets while parsing path: '{item}'"
            )));
        }
        sets.push((start, end));

        if start == end {
            continue;
        }
        for j in start..=end {
            let position = if j < parents.len() { &mut parents[j] } else { &mut end_node };
            *position = position.try_with_location(common_location.as_ref());
        }
    }

    // Second pass: inside a set every node carries the set's location;
    // outside all sets no node carries any.
    let mut current_set: Option<(usize, usize)> = None;
    let mut set_idx = 0;

    for i in 0..=parents.len() {
        while set_idx < sets.len() && current_set.map_or(true, |(_, end)| end < i) {
            current_set = Some(sets[set_idx]);
            set_idx += 1;
        }

        let node = if i < parents.len() { &parents[i] } else { &end_node };
        let inside_set = current_set.map_or(false, |(start, end)| i >= start && i <= end);

        if inside_set {
            let (_, set_end) = current_set.expect("inside a set");
            let expected = if set_end < parents.len() { &parents[set_end] } else { &end_node };
            if node.location() != expected.location() {
                return Err(Error::Parse(format!(
                    "expected all nodes in the set to be individualized the same, found {} with location",
                    node.code()
                )));
            }
        } else if node.location().is_some() {
            return Err(Error::Parse(format!(
                "expected all nodes outside set to be without individualization, found {}",
                node.code()
            )));
        }
    }

    Ok(GmodPath::new_unchecked(gmod.clone(), parents, end_node))
}
