//! Closed loops.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::compare::{loop_compare, loop_equals, loop_hash};
use super::{require_len, reverse_negated, walk_loop, ChainComparison, ChainPattern};
use crate::conclusion::{pair_conclusions, ConclusionSet};
use crate::config::ChainingConfig;
use crate::error::Result;
use crate::fabric::Grid;
use crate::format::RxCyConverter;
use crate::node::{Node, NodeArena, NodeComparison, NodeId};

/// Smallest closed alternating cycle: two strong and two weak links.
const MIN_LOOP_LEN: usize = 4;

/// A cycle of alternating links, link 0 strong, with a wrap link from the
/// last node back to the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loop {
    nodes: Vec<Node>,
}

impl Loop {
    /// Walk first parents from `last` until the walk meets `last` again.
    ///
    /// Loops have no preferred direction or start, so nothing is reversed.
    pub fn from_arena(arena: &NodeArena, last: NodeId, config: &ChainingConfig) -> Result<Self> {
        Self::from_nodes(walk_loop(arena, last, config)?)
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        require_len(&nodes, MIN_LOOP_LEN)?;
        Ok(Self { nodes })
    }

    /// Reflection of the cycle, states negated.
    pub fn reversed(&self) -> Self {
        let mut nodes = self.nodes.clone();
        reverse_negated(&mut nodes);
        Self { nodes }
    }

    pub fn equals(
        &self,
        other: &Self,
        node_mode: NodeComparison,
        chain_mode: ChainComparison,
    ) -> bool {
        loop_equals(&self.nodes, &other.nodes, node_mode, chain_mode)
    }

    pub fn hash_code(&self, node_mode: NodeComparison, chain_mode: ChainComparison) -> u64 {
        loop_hash(&self.nodes, node_mode, chain_mode)
    }

    pub fn compare(&self, other: &Self, node_mode: NodeComparison) -> Ordering {
        loop_compare(&self.nodes, &other.nodes, node_mode)
    }
}

impl ChainPattern for Loop {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn weak_start_identity(&self) -> usize {
        0
    }

    fn loop_identity(&self) -> usize {
        0
    }

    fn is_named(&self) -> bool {
        false
    }

    /// Every weak link turns into a strong one, so candidates seeing both of
    /// its ends are gone.
    fn conclusions(&self, grid: &dyn Grid) -> ConclusionSet {
        let n = self.nodes.len();
        let mut result = ConclusionSet::new();
        for i in (1..n).step_by(2) {
            result.extend(pair_conclusions(grid, &self.nodes[i], &self.nodes[(i + 1) % n]));
        }
        result
    }
}

impl PartialEq for Loop {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, NodeComparison::IgnoreState, ChainComparison::Undirected)
    }
}

impl Eq for Loop {}

impl Hash for Loop {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code(NodeComparison::IgnoreState, ChainComparison::Undirected));
    }
}

/// Continuous nice loop: the named technique built on [`Loop`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContinuousNiceLoop {
    inner: Loop,
}

impl ContinuousNiceLoop {
    pub fn from_arena(arena: &NodeArena, last: NodeId, config: &ChainingConfig) -> Result<Self> {
        Ok(Self {
            inner: Loop::from_arena(arena, last, config)?,
        })
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        Ok(Self {
            inner: Loop::from_nodes(nodes)?,
        })
    }

    pub fn as_loop(&self) -> &Loop {
        &self.inner
    }

    pub fn equals(
        &self,
        other: &Self,
        node_mode: NodeComparison,
        chain_mode: ChainComparison,
    ) -> bool {
        self.inner.equals(&other.inner, node_mode, chain_mode)
    }

    pub fn hash_code(&self, node_mode: NodeComparison, chain_mode: ChainComparison) -> u64 {
        self.inner.hash_code(node_mode, chain_mode)
    }

    pub fn compare(&self, other: &Self, node_mode: NodeComparison) -> Ordering {
        self.inner.compare(&other.inner, node_mode)
    }
}

impl ChainPattern for ContinuousNiceLoop {
    fn nodes(&self) -> &[Node] {
        self.inner.nodes()
    }

    fn weak_start_identity(&self) -> usize {
        self.inner.weak_start_identity()
    }

    fn loop_identity(&self) -> usize {
        self.inner.loop_identity()
    }

    fn is_named(&self) -> bool {
        true
    }

    fn conclusions(&self, grid: &dyn Grid) -> ConclusionSet {
        self.inner.conclusions(grid)
    }
}

impl fmt::Display for Loop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(&RxCyConverter))
    }
}

impl fmt::Display for ContinuousNiceLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::candidate_of;
    use crate::chain::test_support::{nodes_of, push_spine};
    use crate::conclusion::Conclusion;
    use crate::error::ChainError;
    use crate::fabric::CandidateFabric;
    use crate::link::LinkPools;
    use proptest::prelude::*;

    /// r1c1 == r1c5 -- r5c5 == r5c1 -- back to r1c1, all on digit 1.
    fn rectangle() -> Vec<Node> {
        nodes_of(&[(0, 0, false), (4, 0, true), (40, 0, false), (36, 0, true)])
    }

    #[test]
    fn test_from_arena_closes_on_terminal() {
        let mut arena = NodeArena::new();
        let leaf = push_spine(
            &mut arena,
            &[
                (36, 0, true),
                (0, 0, false),
                (4, 0, true),
                (40, 0, false),
                (36, 0, true),
            ],
        );
        let cycle = Loop::from_arena(&arena, leaf, &ChainingConfig::default()).unwrap();
        assert_eq!(cycle.nodes(), rectangle().as_slice());
    }

    #[test]
    fn test_too_short() {
        let nodes = nodes_of(&[(0, 0, false), (4, 0, true)]);
        assert_eq!(Loop::from_nodes(nodes).unwrap_err(), ChainError::EmptyChain(2));
    }

    #[test]
    fn test_links_wrap_around() {
        let cycle = Loop::from_nodes(rectangle()).unwrap();
        let links = cycle.links(&LinkPools::new());
        assert_eq!(links.len(), 4);
        assert!(links[0].is_strong);
        assert!(!links[3].is_strong);
        assert_eq!(links[3].first, Node::on(candidate_of(36, 0)));
        assert_eq!(links[3].second, Node::off(candidate_of(0, 0)));
    }

    #[test]
    fn test_weak_links_eliminate() {
        let grid = CandidateFabric::empty();
        let cycle = ContinuousNiceLoop::from_nodes(rectangle()).unwrap();
        let conclusions = cycle.conclusions(&grid);
        // The rest of columns 1 and 5 on digit 1.
        assert_eq!(conclusions.len(), 14);
        assert!(conclusions.contains(&Conclusion::elimination(candidate_of(13, 0))));
        assert!(conclusions.contains(&Conclusion::elimination(candidate_of(72, 0))));
        assert!(cycle.is_named());
        assert!(!cycle.as_loop().is_named());
    }

    #[test]
    fn test_reflection_is_directed_distinct() {
        let cycle = Loop::from_nodes(rectangle()).unwrap();
        let reflected = cycle.reversed();
        assert_eq!(cycle, reflected);
        assert!(!cycle.equals(&reflected, NodeComparison::IgnoreState, ChainComparison::Directed));
    }

    #[test]
    fn test_display_closes_the_cycle() {
        let cycle = Loop::from_nodes(rectangle()).unwrap();
        assert_eq!(
            cycle.to_string(),
            "r1c1(1) == r1c5(1) -- r5c5(1) == r5c1(1) -- r1c1(1)"
        );
    }

    proptest! {
        #[test]
        fn test_rotations_collapse(shift in 0usize..4) {
            let cycle = Loop::from_nodes(rectangle()).unwrap();
            let mut nodes = rectangle();
            nodes.rotate_left(shift);
            let rotated = Loop::from_nodes(nodes).unwrap();
            prop_assert!(cycle.equals(&rotated, NodeComparison::IncludeState, ChainComparison::Directed));
            prop_assert_eq!(cycle.compare(&rotated, NodeComparison::IgnoreState), Ordering::Equal);
            prop_assert_eq!(
                cycle.hash_code(NodeComparison::IgnoreState, ChainComparison::Undirected),
                rotated.hash_code(NodeComparison::IgnoreState, ChainComparison::Undirected)
            );
        }
    }
}
