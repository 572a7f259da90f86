//! Alternating inference chains and wing classification.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::compare::{open_compare, open_equals, open_hash};
use super::{canonicalize, require_len, reverse_negated, walk_open, ChainComparison, ChainPattern};
use crate::candidate::{cell_of, digit_of, mask_is_single, CellMap, Mask};
use crate::conclusion::{pair_conclusions, ConclusionSet};
use crate::config::ChainingConfig;
use crate::error::Result;
use crate::fabric::Grid;
use crate::format::RxCyConverter;
use crate::link::{LinkPools, LinkType};
use crate::node::{Node, NodeArena, NodeComparison, NodeId};

/// An open chain of alternating strong and weak links.
///
/// When the root is ON the chain starts with a weak link. The root and the
/// leaf are then only there to close the implication and are left out of
/// [`ChainPattern::valid_nodes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternatingInferenceChain {
    nodes: Vec<Node>,
}

impl AlternatingInferenceChain {
    /// Walk from `last` to its root, then canonicalize the direction.
    pub fn from_arena(arena: &NodeArena, last: NodeId, config: &ChainingConfig) -> Result<Self> {
        let mut nodes = walk_open(arena, last, config)?;
        canonicalize(&mut nodes, config);
        Self::from_nodes(nodes)
    }

    /// Wrap an already ordered node list (root first) as is.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        require_len(&nodes, 2)?;
        let chain = Self { nodes };
        require_len(chain.valid_nodes(), 2)?;
        Ok(chain)
    }

    /// Whether link 0 is weak, i.e. the root is ON.
    pub fn is_weak_start(&self) -> bool {
        self.nodes[0].is_on
    }

    /// The same chain read from the other end, every state negated.
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
        open_equals(self.valid_nodes(), other.valid_nodes(), node_mode, chain_mode)
    }

    pub fn hash_code(&self, node_mode: NodeComparison, chain_mode: ChainComparison) -> u64 {
        open_hash(self.valid_nodes(), node_mode, chain_mode)
    }

    pub fn compare(&self, other: &Self, node_mode: NodeComparison) -> Ordering {
        open_compare(self.valid_nodes(), other.valid_nodes(), node_mode)
    }

    // ==================== Wings ====================

    /// Digit masks of the six valid nodes, if every one is a single digit.
    fn split_mask(&self) -> Option<[Mask; 6]> {
        let nodes = self.valid_nodes();
        if nodes.len() != 6 {
            return None;
        }
        let masks: [Mask; 6] = std::array::from_fn(|i| nodes[i].digits());
        masks.iter().all(|&m| mask_is_single(m)).then_some(masks)
    }

    /// `(x=y)-y=y-(y=x)`
    pub fn is_woods_wing(&self) -> bool {
        matches!(self.split_mask(), Some([m1, m2, m3, m4, m5, m6])
            if m2 == m3 && m2 == m4 && m2 == m5 && m1 == m6 && m1 != m2)
    }

    /// `(x=y)-y=(y-x)=x`, either orientation.
    pub fn is_medusa_wing(&self) -> bool {
        matches!(self.split_mask(), Some([m1, m2, m3, m4, m5, m6])
            if (m1 == m5 && m1 == m6 && m2 == m3 && m2 == m4 && m1 != m2)
                || (m1 == m2 && m1 == m6 && m3 == m4 && m3 == m5 && m2 != m3))
    }

    /// `x=x-(x=y)-y=y`
    pub fn is_split_wing(&self) -> bool {
        matches!(self.split_mask(), Some([m1, m2, m3, m4, m5, m6])
            if m1 == m2 && m1 == m3 && m4 == m5 && m4 == m6 && m1 != m4)
    }

    /// `x=(x-z)=(z-y)=y`
    pub fn is_local_wing(&self) -> bool {
        matches!(self.split_mask(), Some([m1, m2, m3, m4, m5, m6])
            if m1 == m2 && m3 == m4 && m5 == m6 && m1 != m3 && m1 != m5)
    }

    /// `(x=y)-y=(y-z)=z` or its mirror.
    pub fn is_hybrid_wing(&self) -> bool {
        matches!(self.split_mask(), Some([m1, m2, m3, m4, m5, m6])
            if (m2 == m3 && m4 == m5 && m4 == m6 && m1 != m2 && m2 != m4)
                || (m1 == m2 && m1 == m3 && m4 == m5 && m1 != m4 && m1 != m6 && m4 != m6))
    }

    /// W-wing whose outer links are both almost-locked-set or bivalue-cell links.
    pub fn is_almost_locked_sets_w_wing(&self, grid: &dyn Grid, pools: &LinkPools) -> bool {
        if !self.is_woods_wing() {
            return false;
        }
        let links = self.links(pools);
        let qualifies = |index: usize| {
            let link = &links[index];
            link.pattern
                .as_ref()
                .is_some_and(|p| p.rule.contains(LinkType::ALMOST_LOCKED_SETS))
                || link.is_bivalue_cell_link(grid)
        };
        !links.is_empty() && qualifies(0) && qualifies(links.len() - 1)
    }

    /// A weak-start chain whose ends already see each other through the grid.
    pub fn is_implicit_loop(&self) -> bool {
        if !self.is_weak_start() {
            return false;
        }
        let (Some(first), Some(last)) = (self.first().candidate(), self.last().candidate()) else {
            return false;
        };
        let (cell1, cell2) = (cell_of(first), cell_of(last));
        if cell1 == cell2 {
            return true;
        }
        let cells: CellMap = [cell1, cell2].into_iter().collect();
        digit_of(first) == digit_of(last) && cells.first_shared_house().is_some()
    }
}

impl ChainPattern for AlternatingInferenceChain {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn valid_nodes(&self) -> &[Node] {
        if self.is_weak_start() {
            &self.nodes[1..self.nodes.len() - 1]
        } else {
            &self.nodes
        }
    }

    fn weak_start_identity(&self) -> usize {
        0
    }

    fn loop_identity(&self) -> usize {
        1
    }

    fn is_named(&self) -> bool {
        true
    }

    fn complexity(&self) -> usize {
        self.nodes.len()
    }

    fn conclusions(&self, grid: &dyn Grid) -> ConclusionSet {
        pair_conclusions(grid, &self.first(), &self.last())
    }
}

impl PartialEq for AlternatingInferenceChain {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, NodeComparison::IgnoreState, ChainComparison::Undirected)
    }
}

impl Eq for AlternatingInferenceChain {}

impl Hash for AlternatingInferenceChain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code(NodeComparison::IgnoreState, ChainComparison::Undirected));
    }
}

impl fmt::Display for AlternatingInferenceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(&RxCyConverter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{candidate_of, CandidateMap};
    use crate::chain::test_support::{nodes_of, push_spine};
    use crate::conclusion::Conclusion;
    use crate::fabric::CandidateFabric;
    use crate::link::JustificationPattern;
    use proptest::prelude::*;

    /// Six strong-start nodes with the given 0-based digits in distinct cells.
    fn with_digits(digits: [u8; 6]) -> AlternatingInferenceChain {
        let cells = [0u8, 1, 10, 19, 20, 29];
        let nodes: Vec<Node> = (0..6)
            .map(|i| Node::new(candidate_of(cells[i], digits[i]).into(), i % 2 == 1))
            .collect();
        AlternatingInferenceChain::from_nodes(nodes).unwrap()
    }

    #[test]
    fn test_woods_wing_only() {
        // masks [2,4,4,4,4,2] are digits 1,2,2,2,2,1 (0-based)
        let chain = with_digits([1, 2, 2, 2, 2, 1]);
        assert!(chain.is_woods_wing());
        assert!(!chain.is_medusa_wing());
        assert!(!chain.is_split_wing());
        assert!(!chain.is_local_wing());
        assert!(!chain.is_hybrid_wing());
    }

    #[test]
    fn test_other_wing_shapes() {
        assert!(with_digits([0, 1, 1, 1, 0, 0]).is_medusa_wing());
        assert!(with_digits([0, 0, 0, 1, 1, 1]).is_split_wing());
        assert!(with_digits([0, 0, 2, 2, 1, 1]).is_local_wing());
        assert!(with_digits([0, 1, 1, 2, 2, 2]).is_hybrid_wing());
        assert!(!with_digits([0, 1, 1, 2, 2, 2]).is_woods_wing());
    }

    #[test]
    fn test_wings_need_six_single_digit_nodes() {
        let nodes = nodes_of(&[(0, 1, false), (1, 2, true), (10, 2, false), (19, 1, true)]);
        let chain = AlternatingInferenceChain::from_nodes(nodes).unwrap();
        assert!(!chain.is_woods_wing());
    }

    #[test]
    fn test_weak_start_trims_ends() {
        let nodes = nodes_of(&[
            (0, 0, true),
            (1, 0, false),
            (1, 1, true),
            (2, 1, false),
            (1, 2, true),
            (0, 0, false),
        ]);
        let chain = AlternatingInferenceChain::from_nodes(nodes).unwrap();
        assert!(chain.is_weak_start());
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.complexity(), 6);
        assert_eq!(chain.first(), Node::off(candidate_of(1, 0)));
        assert!(chain.is_implicit_loop());
    }

    #[test]
    fn test_links_alternate_from_strong() {
        let nodes = nodes_of(&[(0, 0, false), (1, 0, true), (1, 1, false), (2, 1, true)]);
        let chain = AlternatingInferenceChain::from_nodes(nodes).unwrap();
        let links = chain.links(&LinkPools::new());
        assert_eq!(links.len(), 3);
        assert!(links[0].is_strong);
        assert!(!links[1].is_strong);
        assert!(links[2].is_strong);
        assert!(!chain.is_x());
    }

    #[test]
    fn test_x_chain_conclusions() {
        let grid = CandidateFabric::empty();
        // r1c1(1) == r1c5(1) -- r5c5(1) == r5c9(1)
        let nodes = nodes_of(&[(0, 0, false), (4, 0, true), (40, 0, false), (44, 0, true)]);
        let chain = AlternatingInferenceChain::from_nodes(nodes).unwrap();
        assert!(chain.is_x());
        let conclusions = chain.conclusions(&grid);
        assert!(conclusions.contains(&Conclusion::elimination(candidate_of(8, 0))));
        assert!(conclusions.contains(&Conclusion::elimination(candidate_of(36, 0))));
        assert_eq!(conclusions.len(), 2);
    }

    #[test]
    fn test_canonical_reversal_from_arena() {
        let mut arena = NodeArena::new();
        // Root ON, second (r2c1) sorts after second-to-last (r1c2): reversed.
        let leaf = push_spine(
            &mut arena,
            &[
                (0, 0, true),
                (9, 0, false),
                (9, 1, true),
                (1, 1, false),
                (1, 0, true),
                (0, 0, false),
            ],
        );
        let config = ChainingConfig::default();
        let chain = AlternatingInferenceChain::from_arena(&arena, leaf, &config).unwrap();
        assert_eq!(chain.nodes()[0], Node::on(candidate_of(0, 0)));
        assert_eq!(chain.nodes()[1], Node::off(candidate_of(1, 0)));

        let kept = AlternatingInferenceChain::from_arena(
            &arena,
            leaf,
            &ChainingConfig::without_reversal(),
        )
        .unwrap();
        assert_eq!(kept.nodes()[1], Node::off(candidate_of(9, 0)));
        assert_eq!(kept, chain);
    }

    #[test]
    fn test_mirror_equality() {
        let nodes = nodes_of(&[(0, 0, false), (4, 0, true), (40, 0, false), (44, 0, true)]);
        let chain = AlternatingInferenceChain::from_nodes(nodes).unwrap();
        let mirrored = chain.reversed();
        assert!(chain.equals(&mirrored, NodeComparison::IgnoreState, ChainComparison::Undirected));
        assert!(!chain.equals(&mirrored, NodeComparison::IgnoreState, ChainComparison::Directed));
        assert_eq!(
            chain.hash_code(NodeComparison::IgnoreState, ChainComparison::Undirected),
            mirrored.hash_code(NodeComparison::IgnoreState, ChainComparison::Undirected)
        );
    }

    #[test]
    fn test_self_constraint_chain_sorts_first() {
        let constrained = AlternatingInferenceChain::from_nodes(nodes_of(&[
            (40, 4, false),
            (41, 4, true),
            (41, 5, false),
            (40, 4, true),
        ]))
        .unwrap();
        let plain = AlternatingInferenceChain::from_nodes(nodes_of(&[
            (0, 0, false),
            (1, 0, true),
            (1, 1, false),
            (2, 1, true),
        ]))
        .unwrap();
        assert_eq!(
            constrained.compare(&plain, NodeComparison::IgnoreState),
            Ordering::Less
        );
    }

    #[test]
    fn test_als_w_wing_through_pattern_pool() {
        let mut grid = CandidateFabric::empty();
        grid.set_candidates(0, 0b110);
        grid.set_candidates(29, 0b110);
        let chain = with_digits([1, 2, 2, 2, 2, 1]);
        // r1c1 holds {2,3}; r4c3 holds {2,3}.
        let bivalue_first = Node::new(candidate_of(0, 1).into(), false);
        let mut pools = LinkPools::new();
        assert!(!chain.is_almost_locked_sets_w_wing(&grid, &pools));

        let nodes = chain.valid_nodes().to_vec();
        assert_eq!(nodes[0], bivalue_first);
        // First link r1c1(2)=r1c2(3) is not inside one cell: justify it with an ALS.
        pools.strong.add_entry(
            nodes[0],
            nodes[1],
            true,
            Some(JustificationPattern {
                rule: LinkType::ALMOST_LOCKED_SETS,
                map: CandidateMap::single(candidate_of(0, 1)),
            }),
        );
        pools.strong.add_entry(
            nodes[4],
            nodes[5],
            true,
            Some(JustificationPattern {
                rule: LinkType::ALMOST_LOCKED_SETS,
                map: CandidateMap::single(candidate_of(29, 1)),
            }),
        );
        assert!(chain.is_almost_locked_sets_w_wing(&grid, &pools));
        assert!(chain.is_strictly_grouped(&pools));
    }

    proptest! {
        #[test]
        fn test_reversal_involution(digits in proptest::collection::vec(0u8..9, 2..10)) {
            let nodes: Vec<Node> = digits
                .iter()
                .enumerate()
                .map(|(i, &d)| Node::new(candidate_of(i as u8 * 9 % 81, d).into(), i % 2 == 1))
                .collect();
            let chain = AlternatingInferenceChain::from_nodes(nodes.clone()).unwrap();
            let once = chain.reversed();
            for (i, node) in once.nodes().iter().enumerate() {
                prop_assert_eq!(*node, !nodes[nodes.len() - 1 - i]);
            }
            let twice = once.reversed();
            prop_assert!(chain.equals(&twice, NodeComparison::IncludeState, ChainComparison::Directed));
        }
    }
}
