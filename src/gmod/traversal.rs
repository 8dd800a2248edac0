//! Occurrence-bounded depth-first traversal over the GMOD graph.
//!
//! The graph contains product-assignment loops, so an unbounded DFS does not
//! terminate. The engine counts how often each code sits on the current
//! parent stack and skips a subtree once the count reaches the configured
//! bound — except across product-selection-assignment edges, which do not
//! consume occurrence budget.
//!
//! The walk uses an explicit frame stack; GMOD depth is data-dependent and
//! recursion depth must not be.

use std::collections::HashMap;

use super::{Gmod, GmodNode};
use crate::{Error, Result};

/// Verdict returned by a traversal handler for each visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalHandlerResult {
    /// Abort the traversal.
    Stop,
    /// Do not descend into this node's children.
    SkipSubtree,
    /// Descend into children.
    Continue,
}

/// How many times one code may appear on the parent stack before its subtree
/// is skipped.
pub const DEFAULT_MAX_TRAVERSAL_OCCURRENCE: u32 = 1;

#[derive(Debug, Clone)]
pub struct TraversalOptions {
    pub max_traversal_occurrence: u32,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self { max_traversal_occurrence: DEFAULT_MAX_TRAVERSAL_OCCURRENCE }
    }
}

/// The stack of nodes above the currently visited one, with per-code
/// occurrence counts.
pub struct Parents<'g> {
    nodes: Vec<&'g GmodNode>,
    occurrences: HashMap<&'g str, u32>,
}

impl<'g> Parents<'g> {
    fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(64),
            occurrences: HashMap::with_capacity(32),
        }
    }

    fn push(&mut self, node: &'g GmodNode) {
        self.nodes.push(node);
        *self.occurrences.entry(node.code()).or_insert(0) += 1;
    }

    fn pop(&mut self) {
        let Some(node) = self.nodes.pop() else {
            return;
        };
        if let Some(count) = self.occurrences.get_mut(node.code()) {
            *count -= 1;
            if *count == 0 {
                self.occurrences.remove(node.code());
            }
        }
    }

    /// How many times `node`'s code currently sits on the stack.
    pub fn occurrences(&self, node: &GmodNode) -> u32 {
        self.occurrences.get(node.code()).copied().unwrap_or(0)
    }

    pub fn last(&self) -> Option<&'g GmodNode> {
        self.nodes.last().copied()
    }

    /// The stack bottom-up: root first.
    pub fn as_list(&self) -> &[&'g GmodNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

enum VisitOutcome {
    Descend,
    Skip,
    Stop,
}

fn visit<'g, S, H>(
    state: &mut S,
    handler: &mut H,
    parents: &Parents<'g>,
    node: &'g GmodNode,
    max_occurrence: u32,
) -> VisitOutcome
where
    H: FnMut(&mut S, &Parents<'g>, &'g GmodNode) -> TraversalHandlerResult,
{
    // Nodes flagged as not installing their substructure are transparent to
    // the walk: neither visited nor descended into.
    if node.metadata().install_substructure() == Some(false) {
        return VisitOutcome::Skip;
    }

    match handler(state, parents, node) {
        TraversalHandlerResult::Stop => VisitOutcome::Stop,
        TraversalHandlerResult::SkipSubtree => VisitOutcome::Skip,
        TraversalHandlerResult::Continue => {
            let skip_occurrence_check =
                Gmod::is_product_selection_assignment(parents.last(), Some(node));
            if !skip_occurrence_check && parents.occurrences(node) == max_occurrence {
                return VisitOutcome::Skip;
            }
            VisitOutcome::Descend
        }
    }
}

/// Walk the graph depth-first from `start`, visiting a node before its
/// children (children in declared order). Returns `true` iff no handler
/// returned [`TraversalHandlerResult::Stop`].
pub(crate) fn traverse_from<'g, S, H>(
    gmod: &'g Gmod,
    start: &'g GmodNode,
    state: &mut S,
    mut handler: H,
    options: &TraversalOptions,
) -> bool
where
    H: FnMut(&mut S, &Parents<'g>, &'g GmodNode) -> TraversalHandlerResult,
{
    let max_occurrence = options.max_traversal_occurrence;
    let mut parents = Parents::new();
    let mut stack: Vec<(&'g GmodNode, usize)> = Vec::with_capacity(64);

    match visit(state, &mut handler, &parents, start, max_occurrence) {
        VisitOutcome::Stop => return false,
        VisitOutcome::Skip => return true,
        VisitOutcome::Descend => {
            parents.push(start);
            stack.push((start, 0));
        }
    }

    while let Some(frame) = stack.last_mut() {
        let (node, child_idx) = (frame.0, frame.1);
        let children = gmod.children(node.id());

        if child_idx >= children.len() {
            stack.pop();
            parents.pop();
            continue;
        }
        frame.1 += 1;

        let child = gmod.node(children[child_idx]);
        match visit(state, &mut handler, &parents, child, max_occurrence) {
            VisitOutcome::Stop => return false,
            VisitOutcome::Skip => continue,
            VisitOutcome::Descend => {
                parents.push(child);
                stack.push((child, 0));
            }
        }
    }

    true
}

// ============================================================================
// Path existence
// ============================================================================

struct PathExistsState<'g> {
    remaining: Vec<&'g GmodNode>,
    error: Option<Error>,
}

/// Whether a downward path exists that starts with `from_path` (code for
/// code) and ends at a node with `to`'s code. On success the second element
/// is the chain between `from_path` and the target, exclusive on both ends
/// plus the target's parents — i.e. the parents the caller must splice in.
///
/// The search starts at the last ASSET FUNCTION node of `from_path` (the
/// root when there is none) and reconstructs each candidate's ancestry
/// upward through single-parent links.
pub fn path_exists_between<'g>(
    gmod: &'g Gmod,
    from_path: &[GmodNode],
    to: &GmodNode,
) -> Result<(bool, Vec<&'g GmodNode>)> {
    let start = from_path
        .iter()
        .rev()
        .find(|node| node.metadata().category() == super::CATEGORY_ASSET_FUNCTION)
        .map(|node| gmod.node(node.id()))
        .unwrap_or_else(|| gmod.root_node());

    let from_codes: Vec<&str> = from_path.iter().map(|node| node.code()).collect();
    let to_code = to.code();

    let mut state = PathExistsState { remaining: Vec::new(), error: None };

    let completed = traverse_from(
        gmod,
        start,
        &mut state,
        |state, parents, node| {
            if node.code() != to_code {
                return TraversalHandlerResult::Continue;
            }

            let mut chain: Vec<&'g GmodNode> = parents.as_list().to_vec();
            if !chain.is_empty() && !chain[0].is_root() {
                let mut head = chain[0];
                while !head.is_root() {
                    let head_parents = gmod.parents(head.id());
                    if head_parents.is_empty() {
                        break;
                    }
                    if head_parents.len() != 1 {
                        state.error = Some(Error::InvalidPath(
                            "invalid state - expected one parent during path reconstruction"
                                .to_string(),
                        ));
                        return TraversalHandlerResult::Stop;
                    }
                    head = gmod.node(head_parents[0]);
                    chain.insert(0, head);
                }
            }

            if chain.len() < from_codes.len() {
                return TraversalHandlerResult::Continue;
            }
            for (i, &code) in from_codes.iter().enumerate() {
                if chain[i].code() != code {
                    return TraversalHandlerResult::Continue;
                }
            }

            state.remaining = chain[from_codes.len()..].to_vec();
            TraversalHandlerResult::Stop
        },
        &TraversalOptions::default(),
    );

    if let Some(error) = state.error {
        return Err(error);
    }
    Ok((!completed, state.remaining))
}
