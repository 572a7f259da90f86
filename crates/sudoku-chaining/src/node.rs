//! Chain nodes and the arena that holds their parent links.
//!
//! A [`Node`] is a pure value: a candidate set asserted ON or OFF. The parent
//! relation lives in a [`NodeArena`], where every slot may only point at slots
//! pushed before it. Parent walks over the arena therefore always terminate.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Not;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, CandidateMap, Mask};
use crate::error::{ChainError, Result};
use crate::logging::targets;

// ==================== Comparison mode ====================

/// How two nodes are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeComparison {
    /// Map and ON/OFF state must both match.
    IncludeState,
    /// Only the candidate map matters.
    IgnoreState,
}

impl TryFrom<u8> for NodeComparison {
    type Error = ChainError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(NodeComparison::IncludeState),
            1 => Ok(NodeComparison::IgnoreState),
            other => Err(ChainError::InvalidComparison(other)),
        }
    }
}

// ==================== Node ====================

/// An assertion that a candidate set is ON (true) or OFF (false).
///
/// The std traits (`Eq`, `Ord`, `Hash`) use [`NodeComparison::IncludeState`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Node {
    pub map: CandidateMap,
    pub is_on: bool,
}

impl Node {
    pub fn new(map: CandidateMap, is_on: bool) -> Self {
        Self { map, is_on }
    }

    /// Single-candidate ON node.
    pub fn on(candidate: Candidate) -> Self {
        Self::new(CandidateMap::single(candidate), true)
    }

    /// Single-candidate OFF node.
    pub fn off(candidate: Candidate) -> Self {
        Self::new(CandidateMap::single(candidate), false)
    }

    /// Whether the node spans more than one candidate.
    #[inline]
    pub fn is_grouped(&self) -> bool {
        self.map.len() >= 2
    }

    /// The candidate of a non-grouped node.
    #[inline]
    pub fn candidate(&self) -> Option<Candidate> {
        self.map.as_single()
    }

    #[inline]
    pub fn digits(&self) -> Mask {
        self.map.digits()
    }

    /// Projection both comparison and hashing are defined on.
    #[inline]
    fn key(&self, mode: NodeComparison) -> (Option<bool>, &CandidateMap) {
        match mode {
            NodeComparison::IncludeState => (Some(self.is_on), &self.map),
            NodeComparison::IgnoreState => (None, &self.map),
        }
    }

    /// Total order under `mode`: state first (OFF before ON) when included, then map.
    pub fn compare(&self, other: &Node, mode: NodeComparison) -> Ordering {
        self.key(mode).cmp(&other.key(mode))
    }

    pub fn equals(&self, other: &Node, mode: NodeComparison) -> bool {
        self.compare(other, mode) == Ordering::Equal
    }

    /// Feed the mode projection into `state`.
    pub fn hash_into<H: Hasher>(&self, state: &mut H, mode: NodeComparison) {
        self.key(mode).hash(state);
    }

    /// Standalone hash code under `mode`.
    pub fn hash_code(&self, mode: NodeComparison) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_into(&mut hasher, mode);
        hasher.finish()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, NodeComparison::IncludeState)
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other, NodeComparison::IncludeState)
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_into(state, NodeComparison::IncludeState);
    }
}

impl Not for Node {
    type Output = Node;

    fn not(self) -> Node {
        Node::new(self.map, !self.is_on)
    }
}

// ==================== Arena ids and parent sets ====================

/// Index of a slot in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ordered parent list of a slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSet(Vec<NodeId>);

impl NodeSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, id: NodeId) {
        self.0.push(id);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.0.first().copied()
    }

    /// The sole member of a one-element set.
    pub fn as_single(&self) -> Option<NodeId> {
        match self.0.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }
}

impl From<NodeId> for NodeSet {
    fn from(id: NodeId) -> Self {
        Self(vec![id])
    }
}

impl From<Option<NodeId>> for NodeSet {
    fn from(id: Option<NodeId>) -> Self {
        Self(id.into_iter().collect())
    }
}

impl FromIterator<NodeId> for NodeSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ==================== Slot variants ====================

/// A single-candidate node justified by every one of its parents at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiparentNode {
    pub candidate: Candidate,
    pub is_on: bool,
    pub parents: NodeSet,
}

impl MultiparentNode {
    /// The node value this slot asserts.
    pub fn node(&self) -> Node {
        Node::new(CandidateMap::single(self.candidate), self.is_on)
    }
}

/// One arena slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainNode {
    Node { node: Node, parents: NodeSet },
    Multiparent(MultiparentNode),
}

impl ChainNode {
    pub fn node(&self) -> Node {
        match self {
            ChainNode::Node { node, .. } => *node,
            ChainNode::Multiparent(multi) => multi.node(),
        }
    }

    pub fn parents(&self) -> &NodeSet {
        match self {
            ChainNode::Node { parents, .. } => parents,
            ChainNode::Multiparent(multi) => &multi.parents,
        }
    }

    pub fn is_multiparent(&self) -> bool {
        matches!(self, ChainNode::Multiparent(_))
    }
}

// ==================== Arena ====================

/// Growable buffer of chain nodes addressed by [`NodeId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeArena {
    slots: Vec<ChainNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.slots.len() as u32)
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if id.index() < self.slots.len() {
            Ok(())
        } else {
            Err(ChainError::UnknownNode(id.index()))
        }
    }

    /// Push a parentless node.
    pub fn push_root(&mut self, node: Node) -> NodeId {
        let id = self.next_id();
        self.slots.push(ChainNode::Node {
            node,
            parents: NodeSet::new(),
        });
        id
    }

    /// Push a node with at most one parent.
    pub fn push(&mut self, node: Node, parent: Option<NodeId>) -> Result<NodeId> {
        self.bind(node, NodeSet::from(parent))
    }

    /// Bind `node` to a fresh parent set. Every parent must already exist.
    pub fn bind(&mut self, node: Node, parents: NodeSet) -> Result<NodeId> {
        for parent in parents.iter() {
            self.check(parent)?;
        }
        let id = self.next_id();
        self.slots.push(ChainNode::Node { node, parents });
        Ok(id)
    }

    /// Push a multi-parent node.
    pub fn push_multiparent(
        &mut self,
        candidate: Candidate,
        is_on: bool,
        parents: NodeSet,
    ) -> Result<NodeId> {
        for parent in parents.iter() {
            self.check(parent)?;
        }
        let id = self.next_id();
        self.slots.push(ChainNode::Multiparent(MultiparentNode {
            candidate,
            is_on,
            parents,
        }));
        Ok(id)
    }

    /// Push a copy of `id` with the state flipped and the same parents.
    pub fn negate(&mut self, id: NodeId) -> Result<NodeId> {
        let slot = self.slot(id)?.clone();
        let negated = match slot {
            ChainNode::Node { node, parents } => ChainNode::Node {
                node: !node,
                parents,
            },
            ChainNode::Multiparent(mut multi) => {
                multi.is_on = !multi.is_on;
                ChainNode::Multiparent(multi)
            }
        };
        let new_id = self.next_id();
        self.slots.push(negated);
        Ok(new_id)
    }

    pub fn slot(&self, id: NodeId) -> Result<&ChainNode> {
        self.slots
            .get(id.index())
            .ok_or(ChainError::UnknownNode(id.index()))
    }

    /// The node value stored at `id`.
    pub fn node(&self, id: NodeId) -> Result<Node> {
        self.slot(id).map(ChainNode::node)
    }

    pub fn parents(&self, id: NodeId) -> Result<&NodeSet> {
        self.slot(id).map(ChainNode::parents)
    }

    pub fn first_parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.parents(id).map(NodeSet::first)
    }

    /// Ids reached by following first parents, starting after `id`.
    pub fn spine(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = self.first_parent(id)?;
        while let Some(parent) = current {
            result.push(parent);
            current = self.first_parent(parent)?;
        }
        Ok(result)
    }

    /// Follow first parents until a slot without parents.
    pub fn root(&self, id: NodeId) -> Result<NodeId> {
        Ok(self.spine(id)?.last().copied().unwrap_or(id))
    }

    /// Ancestors of `id`.
    ///
    /// A plain node yields its whole first-parent spine. A multi-parent node
    /// yields its first-parent spine plus, for every direct parent, that
    /// parent's own spine; grandparents' other parents are not unfolded.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let slot = self.slot(id)?;
        let mut result = self.spine(id)?;
        if let ChainNode::Multiparent(multi) = slot {
            for parent in multi.parents.iter().skip(1) {
                result.push(parent);
                for ancestor in self.spine(parent)? {
                    if !result.contains(&ancestor) {
                        result.push(ancestor);
                    }
                }
            }
        }
        trace!(target: targets::CONSTRUCTION, "ancestors of {:?}: {}", id, result.len());
        Ok(result)
    }

    pub fn ancestors_len(&self, id: NodeId) -> Result<usize> {
        self.ancestors(id).map(|ancestors| ancestors.len())
    }

    /// Whether a node equal to `ancestor` appears among the ancestors of `child`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, child: NodeId) -> Result<bool> {
        let target = self.node(ancestor)?;
        for id in self.ancestors(child)? {
            if self.node(id)? == target {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
