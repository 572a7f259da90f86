//! Conclusions and the endpoint elimination calculator.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::candidate::{
    candidate_of, cell_of, cells_see, digit_of, mask_digits, mask_is_single, Candidate, CellMap,
};
use crate::fabric::Grid;
use crate::format::{CoordinateConverter, RxCyConverter};
use crate::node::Node;

/// Whether a conclusion places or removes a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConclusionKind {
    Assignment,
    Elimination,
}

/// A single deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Conclusion {
    pub kind: ConclusionKind,
    pub candidate: Candidate,
}

/// Ordered, duplicate-free conclusion list.
pub type ConclusionSet = BTreeSet<Conclusion>;

impl Conclusion {
    pub fn assignment(candidate: Candidate) -> Self {
        Self {
            kind: ConclusionKind::Assignment,
            candidate,
        }
    }

    pub fn elimination(candidate: Candidate) -> Self {
        Self {
            kind: ConclusionKind::Elimination,
            candidate,
        }
    }

    #[inline]
    pub fn is_elimination(&self) -> bool {
        self.kind == ConclusionKind::Elimination
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let converter = RxCyConverter;
        let op = match self.kind {
            ConclusionKind::Assignment => "=",
            ConclusionKind::Elimination => "<>",
        };
        write!(
            f,
            "{}{}{}",
            converter.cell(cell_of(self.candidate)),
            op,
            digit_of(self.candidate) + 1
        )
    }
}

/// Eliminations implied by "at least one of `first`, `last` is true".
///
/// When the two nodes are the same assertion with opposite states the node
/// itself is proven: a single candidate is assigned, a grouped node clears
/// its digit from the peer intersection.
pub fn pair_conclusions<G: Grid + ?Sized>(grid: &G, first: &Node, last: &Node) -> ConclusionSet {
    let mut result = ConclusionSet::new();

    if *first == !*last {
        let Some(head) = first.map.first() else {
            return result;
        };
        if !first.is_grouped() {
            result.insert(Conclusion::assignment(head));
            return result;
        }
        let digit = digit_of(head);
        let cells = first.map.cells_of_digit(digit);
        eliminate_digit_in(grid, &cells.peer_intersection(), digit, &mut result);
        return result;
    }

    match (first.candidate(), last.candidate()) {
        (Some(c1), Some(c2)) => {
            let (cell1, digit1) = (cell_of(c1), digit_of(c1));
            let (cell2, digit2) = (cell_of(c2), digit_of(c2));
            if cell1 == cell2 {
                let others = grid.candidates_mask(cell1) & !(1 << digit1 | 1 << digit2);
                for digit in mask_digits(others) {
                    result.insert(Conclusion::elimination(candidate_of(cell1, digit)));
                }
            } else if digit1 == digit2 {
                let cells: CellMap = [cell1, cell2].into_iter().collect();
                eliminate_digit_in(grid, &cells.peer_intersection(), digit1, &mut result);
            } else if cells_see(cell1, cell2) {
                if grid.candidates_mask(cell1) & (1 << digit2) != 0 {
                    result.insert(Conclusion::elimination(candidate_of(cell1, digit2)));
                }
                if grid.candidates_mask(cell2) & (1 << digit1) != 0 {
                    result.insert(Conclusion::elimination(candidate_of(cell2, digit1)));
                }
            }
        }
        _ => {
            let (p, q) = (first.digits(), last.digits());
            if mask_is_single(p) && p == q {
                let digit = p.trailing_zeros() as u8;
                let cells: CellMap = first.map.cells().iter().chain(last.map.cells().iter()).collect();
                eliminate_digit_in(grid, &cells.peer_intersection(), digit, &mut result);
            }
        }
    }
    result
}

fn eliminate_digit_in<G: Grid + ?Sized>(
    grid: &G,
    cells: &CellMap,
    digit: u8,
    result: &mut ConclusionSet,
) {
    for cell in cells.iter() {
        if grid.candidates_mask(cell) & (1 << digit) != 0 {
            result.insert(Conclusion::elimination(candidate_of(cell, digit)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateMap;
    use crate::fabric::CandidateFabric;

    #[test]
    fn test_display() {
        assert_eq!(Conclusion::assignment(candidate_of(0, 4)).to_string(), "r1c1=5");
        assert_eq!(
            Conclusion::elimination(candidate_of(80, 0)).to_string(),
            "r9c9<>1"
        );
    }

    #[test]
    fn test_serde_encoding() {
        let conclusion = Conclusion::elimination(12);
        let json = serde_json::to_string(&conclusion).unwrap();
        assert_eq!(json, r#"{"kind":"Elimination","candidate":12}"#);
    }

    #[test]
    fn test_self_contradiction_assigns() {
        let grid = CandidateFabric::empty();
        let node = Node::on(candidate_of(3, 3));
        let result = pair_conclusions(&grid, &node, &!node);
        assert_eq!(
            result.into_iter().collect::<Vec<_>>(),
            vec![Conclusion::assignment(candidate_of(3, 3))]
        );
    }

    #[test]
    fn test_same_digit_ends() {
        let grid = CandidateFabric::empty();
        // r1c1(1) and r2c4(1): r1c4..c6 in box 2, r2c1..c3 in box 1.
        let result = pair_conclusions(
            &grid,
            &Node::off(candidate_of(0, 0)),
            &Node::on(candidate_of(12, 0)),
        );
        assert_eq!(result.len(), 6);
        assert!(result.contains(&Conclusion::elimination(candidate_of(4, 0))));
        assert!(result.contains(&Conclusion::elimination(candidate_of(9, 0))));
    }

    #[test]
    fn test_same_cell_ends() {
        let grid = CandidateFabric::empty();
        let result = pair_conclusions(
            &grid,
            &Node::off(candidate_of(40, 1)),
            &Node::on(candidate_of(40, 6)),
        );
        assert_eq!(result.len(), 7);
        assert!(result.iter().all(|c| cell_of(c.candidate) == 40));
    }

    #[test]
    fn test_different_cell_and_digit() {
        let grid = CandidateFabric::empty();
        let result = pair_conclusions(
            &grid,
            &Node::off(candidate_of(0, 1)),
            &Node::on(candidate_of(8, 2)),
        );
        assert_eq!(
            result.into_iter().collect::<Vec<_>>(),
            vec![
                Conclusion::elimination(candidate_of(0, 2)),
                Conclusion::elimination(candidate_of(8, 1)),
            ]
        );

        let unrelated = pair_conclusions(
            &grid,
            &Node::off(candidate_of(0, 1)),
            &Node::on(candidate_of(40, 2)),
        );
        assert!(unrelated.is_empty());
    }

    #[test]
    fn test_grouped_same_digit() {
        let grid = CandidateFabric::empty();
        let group: CandidateMap = [candidate_of(0, 4), candidate_of(1, 4)].into_iter().collect();
        let result = pair_conclusions(
            &grid,
            &Node::new(group, false),
            &Node::on(candidate_of(2, 4)),
        );
        // The rest of row 1 and of box 1 on digit 5.
        assert_eq!(result.len(), 12);
    }
}
