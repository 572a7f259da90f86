use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{AlternatingInferenceChain, ChainComparison, ChainPattern, ContinuousNiceLoop};
use crate::conclusion::ConclusionSet;
use crate::fabric::Grid;
use crate::link::Link;
use crate::node::{Node, NodeComparison};

/// A chain or loop that is a technique on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NamedChain {
    Aic(AlternatingInferenceChain),
    Loop(ContinuousNiceLoop),
}

impl NamedChain {
    fn pattern(&self) -> &dyn ChainPattern {
        match self {
            NamedChain::Aic(chain) => chain,
            NamedChain::Loop(cycle) => cycle,
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, NamedChain::Loop(_))
    }

    /// Chains of different kinds are never equal.
    pub fn equals(
        &self,
        other: &Self,
        node_mode: NodeComparison,
        chain_mode: ChainComparison,
    ) -> bool {
        match (self, other) {
            (NamedChain::Aic(a), NamedChain::Aic(b)) => a.equals(b, node_mode, chain_mode),
            (NamedChain::Loop(a), NamedChain::Loop(b)) => a.equals(b, node_mode, chain_mode),
            _ => false,
        }
    }

    pub fn hash_code(&self, node_mode: NodeComparison, chain_mode: ChainComparison) -> u64 {
        match self {
            NamedChain::Aic(chain) => chain.hash_code(node_mode, chain_mode),
            NamedChain::Loop(cycle) => cycle.hash_code(node_mode, chain_mode),
        }
    }

    /// Shorter first; at equal length chains sort before loops.
    pub fn compare(&self, other: &Self, node_mode: NodeComparison) -> Ordering {
        match (self, other) {
            (NamedChain::Aic(a), NamedChain::Aic(b)) => a.compare(b, node_mode),
            (NamedChain::Loop(a), NamedChain::Loop(b)) => a.compare(b, node_mode),
            _ => self
                .len()
                .cmp(&other.len())
                .then_with(|| self.is_loop().cmp(&other.is_loop())),
        }
    }
}

impl ChainPattern for NamedChain {
    fn nodes(&self) -> &[Node] {
        self.pattern().nodes()
    }

    fn valid_nodes(&self) -> &[Node] {
        self.pattern().valid_nodes()
    }

    fn weak_start_identity(&self) -> usize {
        self.pattern().weak_start_identity()
    }

    fn loop_identity(&self) -> usize {
        self.pattern().loop_identity()
    }

    fn is_named(&self) -> bool {
        true
    }

    fn complexity(&self) -> usize {
        self.pattern().complexity()
    }

    fn raw_links(&self) -> Vec<Link> {
        self.pattern().raw_links()
    }

    fn conclusions(&self, grid: &dyn Grid) -> ConclusionSet {
        self.pattern().conclusions(grid)
    }
}

impl PartialEq for NamedChain {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, NodeComparison::IgnoreState, ChainComparison::Undirected)
    }
}

impl Eq for NamedChain {}

impl Hash for NamedChain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code(NodeComparison::IgnoreState, ChainComparison::Undirected));
    }
}

impl fmt::Display for NamedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedChain::Aic(chain) => fmt::Display::fmt(chain, f),
            NamedChain::Loop(cycle) => fmt::Display::fmt(cycle, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::test_support::nodes_of;
    use crate::fabric::CandidateFabric;

    fn aic() -> NamedChain {
        NamedChain::Aic(
            AlternatingInferenceChain::from_nodes(nodes_of(&[
                (0, 0, false),
                (4, 0, true),
                (40, 0, false),
                (44, 0, true),
            ]))
            .unwrap(),
        )
    }

    fn nice_loop() -> NamedChain {
        NamedChain::Loop(
            ContinuousNiceLoop::from_nodes(nodes_of(&[
                (0, 0, false),
                (4, 0, true),
                (40, 0, false),
                (36, 0, true),
            ]))
            .unwrap(),
        )
    }

    #[test]
    fn test_kinds_never_equal() {
        assert_ne!(aic(), nice_loop());
        assert_eq!(aic(), aic());
        assert_eq!(aic().compare(&nice_loop(), NodeComparison::IgnoreState), Ordering::Less);
    }

    #[test]
    fn test_delegates_conclusions() {
        let grid = CandidateFabric::empty();
        assert_eq!(aic().conclusions(&grid).len(), 2);
        assert_eq!(nice_loop().conclusions(&grid).len(), 14);
        assert_eq!(nice_loop().raw_links().len(), 4);
        assert_eq!(aic().raw_links().len(), 3);
    }
}
