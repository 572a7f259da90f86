use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::push_branch;
use crate::candidate::{Candidate, CandidateMap};
use crate::chain::{AlternatingInferenceChain, ChainComparison, ChainPattern, NamedChain, UnnamedChain};
use crate::conclusion::{Conclusion, ConclusionSet};
use crate::config::ChainingConfig;
use crate::error::{ChainError, Result};
use crate::fabric::Grid;
use crate::link::LinkPools;
use crate::logging::targets;
use crate::node::{Node, NodeArena, NodeComparison};
use crate::rules::ChainingRules;
use crate::view::{ColorIdentifier, View, ViewNode};

/// What the starting candidates of a multiple forcing chain cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultipleForcingKind {
    /// Every candidate of one cell
    Cell,
    /// Every position of one digit, usually inside one house
    House,
    /// Seeded by a unique or avoidable rectangle
    Rectangle,
    /// Seeded by a bivalue universal grave
    BivalueUniversalGrave,
    Unclassified,
}

/// Branches keyed by their starting candidate, in candidate order.
///
/// Assembled by inserting finished branches, then read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultipleForcingChains {
    branches: BTreeMap<Candidate, UnnamedChain>,
    conclusions: ConclusionSet,
    seed: Option<MultipleForcingKind>,
}

impl MultipleForcingChains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the aggregate as seeded by an advanced pattern.
    pub fn with_seed(mut self, seed: MultipleForcingKind) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Add the branch assuming `candidate`.
    pub fn insert(&mut self, candidate: Candidate, branch: UnnamedChain) -> Result<()> {
        if branch.nodes()[0].map != CandidateMap::single(candidate) {
            return Err(ChainError::BranchStartMismatch(candidate));
        }
        if self.branches.contains_key(&candidate) {
            return Err(ChainError::DuplicateBranch(candidate));
        }
        trace!(
            target: targets::FORCING,
            "branch for candidate {}: {} nodes",
            candidate,
            branch.len()
        );
        self.branches.insert(candidate, branch);
        Ok(())
    }

    pub fn add_conclusion(&mut self, conclusion: Conclusion) {
        self.conclusions.insert(conclusion);
    }

    pub fn conclusions(&self) -> &ConclusionSet {
        &self.conclusions
    }

    pub fn get(&self, candidate: Candidate) -> Option<&UnnamedChain> {
        self.branches.get(&candidate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Candidate, &UnnamedChain)> {
        self.branches.iter().map(|(&candidate, branch)| (candidate, branch))
    }

    pub fn branches(&self) -> impl Iterator<Item = &UnnamedChain> {
        self.branches.values()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// The starting candidates as one map.
    pub fn candidates(&self) -> CandidateMap {
        self.branches.keys().copied().collect()
    }

    pub fn is_cell_multiple(&self) -> bool {
        self.candidates().cells().len() == 1
    }

    pub fn is_house_multiple(&self) -> bool {
        self.candidates().digits().is_power_of_two()
    }

    pub fn technique_kind(&self) -> MultipleForcingKind {
        match self.seed {
            Some(seed) => seed,
            None if self.is_cell_multiple() => MultipleForcingKind::Cell,
            None if self.is_house_multiple() => MultipleForcingKind::House,
            None => MultipleForcingKind::Unclassified,
        }
    }

    pub fn is_advanced_multiple(&self) -> bool {
        matches!(
            self.technique_kind(),
            MultipleForcingKind::Rectangle | MultipleForcingKind::BivalueUniversalGrave
        )
    }

    pub fn complexity(&self) -> usize {
        self.branches().map(ChainPattern::len).sum()
    }

    /// Length of every branch, in key order.
    pub fn branched_complexity(&self) -> Vec<usize> {
        self.branches().map(ChainPattern::len).collect()
    }

    pub fn exists<P>(&self, predicate: P) -> bool
    where
        P: FnMut(&UnnamedChain) -> bool,
    {
        self.branches().any(predicate)
    }

    pub fn true_for_all<P>(&self, predicate: P) -> bool
    where
        P: FnMut(&UnnamedChain) -> bool,
    {
        self.branches().all(predicate)
    }

    pub fn equals(
        &self,
        other: &Self,
        node_mode: NodeComparison,
        chain_mode: ChainComparison,
    ) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((k1, b1), (k2, b2))| k1 == k2 && b1.equals(b2, node_mode, chain_mode))
    }

    pub fn hash_code(&self, node_mode: NodeComparison, chain_mode: ChainComparison) -> u64 {
        let mut hasher = DefaultHasher::new();
        for (candidate, branch) in self.iter() {
            candidate.hash(&mut hasher);
            hasher.write_u64(branch.hash_code(node_mode, chain_mode));
        }
        hasher.finish()
    }

    /// Branch count, then starting candidates, then branch by branch.
    pub fn compare(&self, other: &Self, node_mode: NodeComparison) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.candidates().cmp(&other.candidates()))
            .then_with(|| {
                self.branches()
                    .zip(other.branches())
                    .map(|(a, b)| a.compare(b, node_mode))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }

    // ==================== Finned chains ====================

    /// Reduce the aggregate to one alternating chain plus fins.
    ///
    /// Needs a single elimination. Branches of length two whose starting
    /// candidate sees the elimination are fins; exactly two other branches
    /// (krakens) must remain and are stitched into one chain through the
    /// elimination. Returns `None` when that shape is not met.
    ///
    /// # Panics
    ///
    /// Panics if neither kraken contains the eliminated candidate.
    pub fn try_cast_to_finned_chain(&self) -> Option<(NamedChain, CandidateMap)> {
        let mut conclusions = self.conclusions.iter();
        let (Some(conclusion), None) = (conclusions.next(), conclusions.next()) else {
            return None;
        };
        if !conclusion.is_elimination() {
            return None;
        }
        let elimination = conclusion.candidate;

        let mut fins = CandidateMap::empty();
        let mut krakens: Vec<&UnnamedChain> = Vec::with_capacity(2);
        for branch in self.branches() {
            let root = branch.nodes()[0];
            if branch.len() == 2 && root.map.peer_intersection().contains(elimination) {
                fins |= root.map;
                continue;
            }
            if krakens.len() == 2 {
                debug!(target: targets::FORCING, "more than two kraken branches");
                return None;
            }
            krakens.push(branch);
        }
        let [first, second] = krakens[..] else {
            debug!(target: targets::FORCING, "{} kraken branches, need 2", krakens.len());
            return None;
        };
        if fins.is_empty() {
            return None;
        }

        let chain = stitch(first, second, elimination)?;
        debug!(
            target: targets::FORCING,
            "finned chain of {} nodes, {} fin(s)",
            chain.nodes().len(),
            fins.len()
        );
        Some((NamedChain::Aic(chain), fins))
    }

    /// Like [`Self::try_cast_to_finned_chain`], failing with
    /// [`ChainError::CannotCastFinnedChain`].
    pub fn cast_to_finned_chain(&self) -> Result<(NamedChain, CandidateMap)> {
        self.try_cast_to_finned_chain()
            .ok_or(ChainError::CannotCastFinnedChain)
    }

    /// Eliminations every branch agrees on one step in: candidates seeing
    /// every second node of every branch.
    pub fn thorough_conclusions(&self, grid: &dyn Grid) -> ConclusionSet {
        let mut union = CandidateMap::empty();
        for branch in self.branches() {
            if let Some(node) = branch.nodes().get(1) {
                union |= node.map;
            }
        }
        union
            .peer_intersection()
            .iter()
            .filter(|&candidate| grid.exists(candidate) == Some(true))
            .map(Conclusion::elimination)
            .collect()
    }

    // ==================== Views ====================

    /// View 0 shows every branch, view `i + 1` shows branch `i`.
    pub fn views(&self, pools: &LinkPools) -> Vec<View> {
        let skip_first_link = self.conclusions.len() >= 2;
        let initial = self.initial_view_node();
        let mut global = View::new();
        global.extend(initial.clone());
        let mut views = Vec::with_capacity(self.len() + 1);
        for branch in self.branches() {
            push_branch(&mut global, branch, pools, skip_first_link);
            let mut view = View::new();
            view.extend(initial.clone());
            push_branch(&mut view, branch, pools, skip_first_link);
            views.push(view);
        }
        views.insert(0, global);
        views
    }

    /// Views of the finned chain with the fins drawn in Auxiliary2.
    pub fn finned_views(
        &self,
        grid: &dyn Grid,
        pools: &LinkPools,
        rules: &ChainingRules,
    ) -> Option<Vec<View>> {
        let (chain, fins) = self.try_cast_to_finned_chain()?;
        let mut als_index = 0;
        let mut views = chain.views(grid, pools, rules, &mut als_index);
        for view in &mut views {
            for candidate in fins.iter() {
                view.push(ViewNode::Candidate {
                    color: ColorIdentifier::Auxiliary2,
                    candidate,
                });
            }
        }
        Some(views)
    }

    fn initial_view_node(&self) -> Option<ViewNode> {
        let candidates = self.candidates();
        let cells = candidates.cells();
        if self.is_cell_multiple() {
            cells.first().map(|cell| ViewNode::Cell {
                color: ColorIdentifier::Normal,
                cell,
            })
        } else {
            cells.first_shared_house().map(|house| ViewNode::House {
                color: ColorIdentifier::Normal,
                house,
            })
        }
    }
}

/// Join two krakens at the eliminated candidate into one weak-start chain
/// running from `elimination` ON back to `elimination` OFF.
fn stitch(
    first: &UnnamedChain,
    second: &UnnamedChain,
    elimination: Candidate,
) -> Option<AlternatingInferenceChain> {
    let head = first.nodes();
    let sequence: Vec<CandidateMap> = head[..head.len() - 1]
        .iter()
        .chain(second.nodes().iter().rev())
        .map(|node| node.map)
        .collect();
    let target = CandidateMap::single(elimination);
    let index = sequence
        .iter()
        .position(|map| *map == target)
        .expect("eliminated candidate missing from the stitched krakens");

    // Leaf first, then each parent walking away from the elimination.
    let len = sequence.len();
    let mut spine = Vec::with_capacity(len + 1);
    spine.push(Node::new(target, false));
    for x in 0..len {
        let j = (index + 1 + x) % len;
        spine.push(Node::new(sequence[j], x % 2 == 0));
    }

    let mut arena = NodeArena::new();
    let mut parent = None;
    for node in spine.into_iter().rev() {
        parent = Some(arena.push(node, parent).ok()?);
    }
    AlternatingInferenceChain::from_arena(&arena, parent?, &ChainingConfig::default()).ok()
}

impl PartialEq for MultipleForcingChains {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, NodeComparison::IncludeState, ChainComparison::Directed)
    }
}

impl Eq for MultipleForcingChains {}

impl Hash for MultipleForcingChains {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code(NodeComparison::IncludeState, ChainComparison::Directed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::candidate_of;
    use crate::chain::test_support::nodes_of;
    use crate::fabric::CandidateFabric;

    fn branch(triples: &[(u8, u8, bool)]) -> UnnamedChain {
        UnnamedChain::from_nodes(nodes_of(triples)).unwrap()
    }

    /// Digit 1 in row 1 at r1c1, r1c5 and r1c9; every placement removes
    /// r2c2(1). r1c1 sees r2c2 directly and is the fin.
    fn finned() -> MultipleForcingChains {
        let mut chains = MultipleForcingChains::new();
        chains
            .insert(candidate_of(0, 0), branch(&[(0, 0, true), (10, 0, false)]))
            .unwrap();
        chains
            .insert(
                candidate_of(4, 0),
                branch(&[(4, 0, true), (22, 0, false), (19, 0, true), (10, 0, false)]),
            )
            .unwrap();
        chains
            .insert(
                candidate_of(8, 0),
                branch(&[(8, 0, true), (35, 0, false), (28, 0, true), (10, 0, false)]),
            )
            .unwrap();
        chains.add_conclusion(Conclusion::elimination(candidate_of(10, 0)));
        chains
    }

    #[test]
    fn test_insert_validation() {
        let mut chains = MultipleForcingChains::new();
        let start = candidate_of(40, 0);
        assert_eq!(
            chains.insert(candidate_of(40, 1), branch(&[(40, 0, true), (41, 0, false)])),
            Err(ChainError::BranchStartMismatch(candidate_of(40, 1)))
        );
        chains.insert(start, branch(&[(40, 0, true), (41, 0, false)])).unwrap();
        assert_eq!(
            chains.insert(start, branch(&[(40, 0, true), (42, 0, false)])),
            Err(ChainError::DuplicateBranch(start))
        );
    }

    #[test]
    fn test_complexity_adds_up() {
        let chains = finned();
        assert_eq!(chains.complexity(), 10);
        assert_eq!(chains.branched_complexity(), vec![2, 4, 4]);
        assert_eq!(chains.branched_complexity().len(), chains.len());
    }

    #[test]
    fn test_kinds() {
        let chains = finned();
        assert!(chains.is_house_multiple());
        assert!(!chains.is_cell_multiple());
        assert_eq!(chains.technique_kind(), MultipleForcingKind::House);
        assert!(!chains.is_advanced_multiple());

        let seeded = finned().with_seed(MultipleForcingKind::Rectangle);
        assert!(seeded.is_advanced_multiple());
    }

    #[test]
    fn test_finned_chain_round_trip() {
        let chains = finned();
        let (chain, fins) = chains.try_cast_to_finned_chain().unwrap();
        assert_eq!(fins.len(), 1);
        assert!(fins.contains(candidate_of(0, 0)));

        let NamedChain::Aic(aic) = &chain else {
            panic!("expected an alternating inference chain");
        };
        assert!(aic.is_weak_start());
        assert_eq!(aic.nodes().len(), 8);
        assert_eq!(aic.nodes()[0], Node::on(candidate_of(10, 0)));
        assert_eq!(aic.nodes()[7], Node::off(candidate_of(10, 0)));
        let grid = CandidateFabric::empty();
        assert!(chain
            .conclusions(&grid)
            .contains(&Conclusion::elimination(candidate_of(10, 0))));

        let mut without_fin = MultipleForcingChains::new();
        for (candidate, branch) in chains.iter().skip(1) {
            without_fin.insert(candidate, branch.clone()).unwrap();
        }
        without_fin.add_conclusion(Conclusion::elimination(candidate_of(10, 0)));
        assert!(without_fin.try_cast_to_finned_chain().is_none());
        assert_eq!(
            without_fin.cast_to_finned_chain().unwrap_err(),
            ChainError::CannotCastFinnedChain
        );
    }

    #[test]
    #[should_panic(expected = "eliminated candidate missing")]
    fn test_finned_krakens_must_reach_elimination() {
        let mut chains = MultipleForcingChains::new();
        chains
            .insert(candidate_of(0, 0), branch(&[(0, 0, true), (10, 0, false)]))
            .unwrap();
        chains
            .insert(
                candidate_of(4, 0),
                branch(&[(4, 0, true), (22, 0, false), (19, 0, true), (11, 0, false)]),
            )
            .unwrap();
        chains
            .insert(
                candidate_of(8, 0),
                branch(&[(8, 0, true), (35, 0, false), (29, 0, true), (11, 0, false)]),
            )
            .unwrap();
        chains.add_conclusion(Conclusion::elimination(candidate_of(10, 0)));
        let _ = chains.try_cast_to_finned_chain();
    }

    #[test]
    fn test_finned_needs_single_elimination() {
        let mut chains = finned();
        chains.add_conclusion(Conclusion::elimination(candidate_of(11, 0)));
        assert!(chains.try_cast_to_finned_chain().is_none());
    }

    #[test]
    fn test_thorough_conclusions() {
        let grid = CandidateFabric::empty();
        let mut chains = MultipleForcingChains::new();
        chains
            .insert(candidate_of(40, 0), branch(&[(40, 0, true), (41, 0, false)]))
            .unwrap();
        chains
            .insert(candidate_of(40, 1), branch(&[(40, 1, true), (42, 0, false)]))
            .unwrap();
        // Digit 1 in the rest of row 5.
        let conclusions = chains.thorough_conclusions(&grid);
        assert_eq!(conclusions.len(), 7);
        assert!(conclusions.contains(&Conclusion::elimination(candidate_of(36, 0))));
    }

    #[test]
    fn test_views() {
        let chains = finned();
        let views = chains.views(&LinkPools::new());
        assert_eq!(views.len(), 4);
        assert_eq!(
            views[0][0],
            ViewNode::House {
                color: ColorIdentifier::Normal,
                house: 0,
            }
        );
        let links_in = |view: &View| {
            view.iter()
                .filter(|node| matches!(node, ViewNode::Link { .. }))
                .count()
        };
        assert_eq!(links_in(&views[2]), 3);

        let grid = CandidateFabric::empty();
        let finned_views = chains
            .finned_views(&grid, &LinkPools::new(), &ChainingRules::elementary())
            .unwrap();
        assert!(finned_views[0].contains(&ViewNode::Candidate {
            color: ColorIdentifier::Auxiliary2,
            candidate: candidate_of(0, 0),
        }));
    }

    #[test]
    fn test_ordering_and_predicates() {
        let chains = finned();
        let mut smaller = MultipleForcingChains::new();
        smaller
            .insert(candidate_of(40, 0), branch(&[(40, 0, true), (41, 0, false)]))
            .unwrap();
        assert_eq!(smaller.compare(&chains, NodeComparison::IncludeState), Ordering::Less);
        assert_eq!(chains, finned());
        assert!(chains.exists(|b| b.len() == 2));
        assert!(chains.true_for_all(|b| !b.last().is_on));
    }
}
