//! Chains and loops over [`Node`] sequences.
//!
//! Every concrete kind materializes its node list once, from a terminal node
//! in a [`NodeArena`], and is read-only afterwards. Links are not stored; they
//! are derived on demand from node parity and looked up in [`LinkPools`] to
//! recover the pattern that justified a grouped edge.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, Mask};
use crate::conclusion::{Conclusion, ConclusionSet};
use crate::config::ChainingConfig;
use crate::error::{ChainError, Result};
use crate::fabric::Grid;
use crate::format::{format_sequence, CoordinateConverter};
use crate::link::{Inference, Link, LinkPools};
use crate::logging::targets;
use crate::node::{Node, NodeArena, NodeComparison, NodeId};
use crate::rules::{ChainingRules, ViewNodeContext};
use crate::view::{ColorIdentifier, View, ViewNode};

mod aic;
pub mod compare;
mod cycle;
mod forcing;
mod named;

pub use aic::AlternatingInferenceChain;
pub use cycle::{ContinuousNiceLoop, Loop};
pub use forcing::{ForcingBranch, StrongForcingChain, UnnamedChain, WeakForcingChain};
pub use named::NamedChain;

/// How two chains are matched against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainComparison {
    /// A chain equals its mirror image (and, for loops, its rotations).
    Undirected,
    /// Stored direction must match.
    Directed,
}

impl TryFrom<u8> for ChainComparison {
    type Error = ChainError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(ChainComparison::Undirected),
            1 => Ok(ChainComparison::Directed),
            other => Err(ChainError::InvalidComparison(other)),
        }
    }
}

// ==================== Shared surface ====================

/// Read API shared by every chain and loop kind.
pub trait ChainPattern {
    /// Stored nodes, root first.
    fn nodes(&self) -> &[Node];

    /// Nodes used for links and conclusions.
    fn valid_nodes(&self) -> &[Node] {
        self.nodes()
    }

    /// 0 when link 0 is strong, 1 when it is weak.
    fn weak_start_identity(&self) -> usize;

    /// 0 for closed loops (wrap link included), 1 for open chains.
    fn loop_identity(&self) -> usize;

    /// Whether the pattern is a technique on its own rather than a branch.
    fn is_named(&self) -> bool;

    fn is_dynamic(&self) -> bool {
        false
    }

    fn len(&self) -> usize {
        self.valid_nodes().len()
    }

    fn is_empty(&self) -> bool {
        self.valid_nodes().is_empty()
    }

    fn complexity(&self) -> usize {
        self.len()
    }

    fn first(&self) -> Node {
        self.valid_nodes()[0]
    }

    fn last(&self) -> Node {
        self.valid_nodes()[self.len() - 1]
    }

    fn get(&self, index: usize) -> Option<&Node> {
        self.valid_nodes().get(index)
    }

    /// Links without pattern lookup.
    fn raw_links(&self) -> Vec<Link> {
        let nodes = self.valid_nodes();
        let len = nodes.len();
        let count = len.saturating_sub(self.loop_identity());
        (0..count)
            .map(|i| {
                let inference = Inference::from_parity(self.weak_start_identity() + i);
                Link::new(nodes[i], nodes[(i + 1) % len], inference.is_strong())
            })
            .collect()
    }

    /// Links with the justifying pattern attached when the pools know one.
    fn links(&self, pools: &LinkPools) -> Vec<Link> {
        self.raw_links()
            .into_iter()
            .map(|link| {
                let pattern = pools
                    .dictionary(link.inference())
                    .pattern(link.first, link.second, link.is_strong)
                    .cloned();
                link.with_pattern(pattern)
            })
            .collect()
    }

    fn strong_links(&self, pools: &LinkPools) -> Vec<Link> {
        self.links(pools).into_iter().filter(|l| l.is_strong).collect()
    }

    fn weak_links(&self, pools: &LinkPools) -> Vec<Link> {
        self.links(pools).into_iter().filter(|l| !l.is_strong).collect()
    }

    /// At least one node spans several candidates.
    fn is_grouped(&self) -> bool {
        self.valid_nodes().iter().any(Node::is_grouped)
    }

    /// At least one link has a grouped end or an advanced justification.
    fn is_strictly_grouped(&self, pools: &LinkPools) -> bool {
        self.links(pools).iter().any(Link::is_strictly_grouped)
    }

    /// Every node uses the same single digit.
    fn is_x(&self) -> bool {
        self.valid_nodes()
            .iter()
            .fold(0 as Mask, |acc, node| acc | node.digits())
            .is_power_of_two()
    }

    /// Strong links only join different digits, and both ends use the same digits.
    fn is_y(&self) -> bool {
        let strong_inside_digit = self
            .raw_links()
            .iter()
            .any(|link| link.is_strong && link.first.digits() == link.second.digits());
        !strong_inside_digit && self.first().digits() == self.last().digits()
    }

    /// Two nodes share a candidate.
    fn is_overlapped(&self) -> bool {
        let nodes = self.valid_nodes();
        nodes.iter().enumerate().any(|(i, a)| {
            nodes[i + 1..]
                .iter()
                .any(|b| a.map.overlaps(&b.map))
        })
    }

    fn digits_mask(&self) -> Mask {
        self.nodes()
            .iter()
            .fold(0, |acc, node| acc | node.digits())
    }

    fn contains(&self, candidate: Candidate) -> bool {
        self.nodes().iter().any(|node| node.map.contains(candidate))
    }

    /// Whether a node uses a candidate some conclusion touches.
    fn overlaps_with_conclusions<'a, I>(&self, conclusions: I) -> bool
    where
        I: IntoIterator<Item = &'a Conclusion>,
        Self: Sized,
    {
        conclusions.into_iter().any(|conclusion| {
            self.valid_nodes()
                .iter()
                .any(|node| node.map.contains(conclusion.candidate))
        })
    }

    fn find_index<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&Node) -> bool,
        Self: Sized,
    {
        self.valid_nodes().iter().position(predicate)
    }

    fn find_last_index<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&Node) -> bool,
        Self: Sized,
    {
        self.valid_nodes().iter().rposition(predicate)
    }

    /// `length` valid nodes from `start`, or `None` past the end.
    fn slice(&self, start: usize, length: usize) -> Option<&[Node]> {
        let end = start.checked_add(length)?;
        self.valid_nodes().get(start..end)
    }

    /// Conclusions the pattern proves on its own.
    fn conclusions(&self, _grid: &dyn Grid) -> ConclusionSet {
        ConclusionSet::new()
    }

    /// One view: the nodes, the links, then whatever the rules add.
    fn views(
        &self,
        grid: &dyn Grid,
        pools: &LinkPools,
        rules: &ChainingRules,
        als_index: &mut usize,
    ) -> Vec<View> {
        let mut view = View::new();
        for (i, node) in self.valid_nodes().iter().enumerate() {
            let color = if i % 2 == 0 {
                ColorIdentifier::Auxiliary1
            } else {
                ColorIdentifier::Normal
            };
            for candidate in node.map.iter() {
                view.push(ViewNode::Candidate { color, candidate });
            }
        }

        let links = self.links(pools);
        for link in &links {
            view.push(ViewNode::link(ColorIdentifier::Normal, link));
        }

        for rule in rules.iter() {
            let mut context = ViewNodeContext {
                grid,
                nodes: self.valid_nodes(),
                links: &links,
                view: &mut view,
                current_als_index: *als_index,
            };
            rule.view_nodes(&mut context);
            *als_index = context.current_als_index;
        }
        vec![view]
    }

    /// Text form using `converter` for coordinates.
    fn format_with(&self, converter: &dyn CoordinateConverter) -> String {
        let inferences: Vec<Inference> = self.raw_links().iter().map(Link::inference).collect();
        format_sequence(
            self.valid_nodes(),
            &inferences,
            self.loop_identity() == 0,
            converter,
        )
    }
}

// ==================== Construction ====================

/// Walk first parents from `last` to a root. Result is root first.
pub(crate) fn walk_open(
    arena: &NodeArena,
    last: NodeId,
    config: &ChainingConfig,
) -> Result<Vec<Node>> {
    let mut nodes = vec![arena.node(last)?];
    let mut current = arena.first_parent(last)?;
    while let Some(id) = current {
        if nodes.len() > config.max_walk_length {
            return Err(ChainError::WalkTooLong {
                limit: config.max_walk_length,
            });
        }
        nodes.push(arena.node(id)?);
        current = arena.first_parent(id)?;
    }
    nodes.reverse();
    trace!(target: targets::CONSTRUCTION, "open walk from {:?}: {} nodes", last, nodes.len());
    Ok(nodes)
}

/// Walk first parents from `last` until a node equal to it shows up again.
/// The repeated node is not included. Result is root first.
pub(crate) fn walk_loop(
    arena: &NodeArena,
    last: NodeId,
    config: &ChainingConfig,
) -> Result<Vec<Node>> {
    let terminal = arena.node(last)?;
    let mut nodes = vec![terminal];
    let mut current = arena.first_parent(last)?;
    while let Some(id) = current {
        let node = arena.node(id)?;
        if node == terminal {
            nodes.reverse();
            trace!(target: targets::CONSTRUCTION, "loop walk from {:?}: {} nodes", last, nodes.len());
            return Ok(nodes);
        }
        if nodes.len() >= config.max_walk_length {
            return Err(ChainError::WalkTooLong {
                limit: config.max_walk_length,
            });
        }
        nodes.push(node);
        current = arena.first_parent(id)?;
    }
    Err(ChainError::UnclosedLoop { steps: nodes.len() })
}

/// Rebuild back to front, negating every node.
pub(crate) fn reverse_negated(nodes: &mut [Node]) {
    nodes.reverse();
    for node in nodes.iter_mut() {
        *node = !*node;
    }
}

/// Reverse once when the root (the last node reached by the walk) is ON and
/// the node after the root does not sort before the node before the leaf.
pub(crate) fn canonicalize(nodes: &mut [Node], config: &ChainingConfig) -> bool {
    let n = nodes.len();
    if !config.auto_reverse || n < 2 || !nodes[0].is_on {
        return false;
    }
    let should_reverse = nodes[1]
        .compare(&nodes[n - 2], NodeComparison::IgnoreState)
        .is_ge();
    if should_reverse {
        reverse_negated(nodes);
        trace!(target: targets::CANONICAL, "reversed chain of {} nodes", n);
    }
    should_reverse
}

pub(crate) fn require_len(nodes: &[Node], min: usize) -> Result<()> {
    if nodes.len() < min {
        Err(ChainError::EmptyChain(nodes.len()))
    } else {
        Ok(())
    }
}
