//! Branches of forcing chains.
//!
//! A branch starts at an assumed candidate and follows the implications to a
//! terminal node. It keeps the direction it was found in: there is no
//! canonical reversal for a branch.

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

use log::trace;
use serde::{Deserialize, Serialize};

use super::compare::{open_compare, open_equals, open_hash};
use super::{require_len, walk_open, ChainComparison, ChainPattern};
use crate::config::ChainingConfig;
use crate::error::Result;
use crate::format::RxCyConverter;
use crate::link::Link;
use crate::logging::targets;
use crate::node::{Node, NodeArena, NodeComparison, NodeId};

/// The nodes of one branch, root first.
///
/// A dynamic branch also keeps every link between a node and each of its
/// parents, since its nodes no longer form a single path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcingBranch {
    nodes: Vec<Node>,
    dynamic_links: Option<Vec<Link>>,
}

impl ForcingBranch {
    /// Linear walk by first parents, or the full ancestor set when the
    /// configuration asks for dynamic chains.
    pub fn from_arena(arena: &NodeArena, last: NodeId, config: &ChainingConfig) -> Result<Self> {
        if config.dynamic {
            Self::from_arena_dynamic(arena, last)
        } else {
            Self::from_nodes(walk_open(arena, last, config)?)
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        require_len(&nodes, 1)?;
        Ok(Self {
            nodes,
            dynamic_links: None,
        })
    }

    /// Breadth-first over every parent of every node reached from `last`.
    fn from_arena_dynamic(arena: &NodeArena, last: NodeId) -> Result<Self> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut order = Vec::new();
        let mut links = Vec::new();

        seen.insert(last);
        queue.push_back(last);
        while let Some(id) = queue.pop_front() {
            let node = arena.node(id)?;
            order.push(id);
            for parent in arena.parents(id)?.iter() {
                let parent_node = arena.node(parent)?;
                let link = Link::new(parent_node, node, !parent_node.is_on);
                if !links.iter().any(|l: &Link| l.equals(&link, ChainComparison::Directed)) {
                    links.push(link);
                }
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }

        // Root of the first-parent spine leads, the terminal stays last.
        order.reverse();
        let root = arena.root(last)?;
        if let Some(pos) = order.iter().position(|&id| id == root) {
            order[..=pos].rotate_right(1);
        }
        let nodes = order
            .into_iter()
            .map(|id| arena.node(id))
            .collect::<Result<Vec<Node>>>()?;
        trace!(
            target: targets::CONSTRUCTION,
            "dynamic branch from {:?}: {} nodes, {} links",
            last,
            nodes.len(),
            links.len()
        );
        Ok(Self {
            nodes,
            dynamic_links: Some(links),
        })
    }
}

impl ChainPattern for ForcingBranch {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// An ON assumption reaches its first consequence through a weak link.
    fn weak_start_identity(&self) -> usize {
        usize::from(self.nodes[0].is_on)
    }

    fn loop_identity(&self) -> usize {
        1
    }

    fn is_named(&self) -> bool {
        false
    }

    fn is_dynamic(&self) -> bool {
        self.dynamic_links.is_some()
    }

    fn raw_links(&self) -> Vec<Link> {
        if let Some(links) = &self.dynamic_links {
            return links.clone();
        }
        let n = self.nodes.len();
        (0..n.saturating_sub(1))
            .map(|i| {
                let (a, b) = (self.nodes[i], self.nodes[i + 1]);
                Link::new(a, b, !a.is_on)
            })
            .collect()
    }
}

macro_rules! forcing_branch_kind {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $name(ForcingBranch);

        impl $name {
            pub fn branch(&self) -> &ForcingBranch {
                &self.0
            }
        }

        impl ChainPattern for $name {
            fn nodes(&self) -> &[Node] {
                self.0.nodes()
            }

            fn weak_start_identity(&self) -> usize {
                self.0.weak_start_identity()
            }

            fn loop_identity(&self) -> usize {
                self.0.loop_identity()
            }

            fn is_named(&self) -> bool {
                false
            }

            fn is_dynamic(&self) -> bool {
                self.0.is_dynamic()
            }

            fn raw_links(&self) -> Vec<Link> {
                self.0.raw_links()
            }
        }
    };
}

forcing_branch_kind!(
    /// A branch ending in an ON node: the assumption forces a placement.
    StrongForcingChain
);

forcing_branch_kind!(
    /// A branch ending in an OFF node: the assumption forces an elimination.
    WeakForcingChain
);

/// A forcing-chain branch, classified by the state of its terminal node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UnnamedChain {
    Strong(StrongForcingChain),
    Weak(WeakForcingChain),
}

impl UnnamedChain {
    pub fn build(arena: &NodeArena, last: NodeId, config: &ChainingConfig) -> Result<Self> {
        ForcingBranch::from_arena(arena, last, config).map(Self::from_branch)
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        ForcingBranch::from_nodes(nodes).map(Self::from_branch)
    }

    pub fn from_branch(branch: ForcingBranch) -> Self {
        let terminal_on = branch.nodes[branch.nodes.len() - 1].is_on;
        if terminal_on {
            UnnamedChain::Strong(StrongForcingChain(branch))
        } else {
            UnnamedChain::Weak(WeakForcingChain(branch))
        }
    }

    pub fn branch(&self) -> &ForcingBranch {
        match self {
            UnnamedChain::Strong(chain) => chain.branch(),
            UnnamedChain::Weak(chain) => chain.branch(),
        }
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, UnnamedChain::Strong(_))
    }

    pub fn equals(
        &self,
        other: &Self,
        node_mode: NodeComparison,
        chain_mode: ChainComparison,
    ) -> bool {
        open_equals(self.nodes(), other.nodes(), node_mode, chain_mode)
    }

    pub fn hash_code(&self, node_mode: NodeComparison, chain_mode: ChainComparison) -> u64 {
        open_hash(self.nodes(), node_mode, chain_mode)
    }

    pub fn compare(&self, other: &Self, node_mode: NodeComparison) -> Ordering {
        open_compare(self.nodes(), other.nodes(), node_mode)
    }
}

impl ChainPattern for UnnamedChain {
    fn nodes(&self) -> &[Node] {
        self.branch().nodes()
    }

    fn weak_start_identity(&self) -> usize {
        self.branch().weak_start_identity()
    }

    fn loop_identity(&self) -> usize {
        1
    }

    fn is_named(&self) -> bool {
        false
    }

    fn is_dynamic(&self) -> bool {
        self.branch().is_dynamic()
    }

    fn raw_links(&self) -> Vec<Link> {
        self.branch().raw_links()
    }
}

impl PartialEq for UnnamedChain {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, NodeComparison::IncludeState, ChainComparison::Directed)
    }
}

impl Eq for UnnamedChain {}

impl Hash for UnnamedChain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code(NodeComparison::IncludeState, ChainComparison::Directed));
    }
}

impl fmt::Display for UnnamedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(&RxCyConverter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::candidate_of;
    use crate::chain::test_support::{nodes_of, push_spine};
    use crate::node::NodeSet;

    #[test]
    fn test_branch_keeps_direction() {
        let mut arena = NodeArena::new();
        let leaf = push_spine(
            &mut arena,
            &[(0, 0, true), (1, 0, false), (1, 1, true), (2, 1, false)],
        );
        let chain = UnnamedChain::build(&arena, leaf, &ChainingConfig::default()).unwrap();
        assert_eq!(
            chain.nodes(),
            nodes_of(&[(0, 0, true), (1, 0, false), (1, 1, true), (2, 1, false)]).as_slice()
        );
        assert!(!chain.is_strong());
        assert!(!chain.is_dynamic());
        assert_eq!(chain.weak_start_identity(), 1);
    }

    #[test]
    fn test_links_follow_states() {
        let chain = UnnamedChain::from_nodes(nodes_of(&[(0, 0, true), (1, 0, false), (1, 1, true)]))
            .unwrap();
        assert!(chain.is_strong());
        let links = chain.raw_links();
        assert_eq!(links.len(), 2);
        assert!(!links[0].is_strong);
        assert!(links[1].is_strong);
        assert_eq!(chain.to_string(), "r1c1(1) -- r1c2(1) == r1c2(2)");
    }

    #[test]
    fn test_dynamic_branch_collects_every_parent() {
        let mut arena = NodeArena::new();
        let root = arena.push_root(Node::on(candidate_of(0, 0)));
        let left = arena.push(Node::off(candidate_of(1, 0)), Some(root)).unwrap();
        let right = arena.push(Node::off(candidate_of(9, 0)), Some(root)).unwrap();
        let parents: NodeSet = [left, right].into_iter().collect();
        let leaf = arena.bind(Node::on(candidate_of(10, 0)), parents).unwrap();

        let chain = UnnamedChain::build(&arena, leaf, &ChainingConfig::dynamic()).unwrap();
        assert!(chain.is_dynamic());
        assert_eq!(chain.nodes().len(), 4);
        assert_eq!(chain.nodes()[0], Node::on(candidate_of(0, 0)));
        assert_eq!(chain.nodes()[3], Node::on(candidate_of(10, 0)));
        let links = chain.raw_links();
        assert_eq!(links.len(), 4);
        assert_eq!(links.iter().filter(|l| l.is_strong).count(), 2);
    }

    #[test]
    fn test_equality_is_directed_by_default() {
        let a = UnnamedChain::from_nodes(nodes_of(&[(0, 0, true), (1, 0, false)])).unwrap();
        let b = UnnamedChain::from_nodes(nodes_of(&[(1, 0, false), (0, 0, true)])).unwrap();
        assert_ne!(a, b);
        assert!(a.equals(&b, NodeComparison::IncludeState, ChainComparison::Undirected));
    }
}
