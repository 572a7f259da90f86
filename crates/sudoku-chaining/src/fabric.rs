//! Grid boundary and the concrete candidate grid.
//!
//! The chain engine only talks to a puzzle through the [`Grid`] trait.
//! [`CandidateFabric`] is the bundled implementation: a dual-indexed
//! candidate state answering "which cells in house H hold digit d?" in O(1).

use crate::candidate::{
    candidate_of, cell_houses, cell_of, digit_of, house_cells, mask_digits, Candidate,
    CandidateMap, Cell, Digit, House, Mask, CELLS, DIGITS, HOUSES,
};
use crate::error::{ChainError, Result};
use crate::node::Node;

const ALL_DIGITS: Mask = (1 << DIGITS) - 1;

/// Read/apply surface the chain engine needs from a puzzle grid.
pub trait Grid {
    /// Placed digit of a cell.
    fn digit_at(&self, cell: Cell) -> Option<Digit>;

    /// Remaining candidate digits of an empty cell (0 for filled cells).
    fn candidates_mask(&self, cell: Cell) -> Mask;

    /// `None` when the cell is filled, otherwise whether the candidate remains.
    fn exists(&self, candidate: Candidate) -> Option<bool> {
        let cell = cell_of(candidate);
        if self.digit_at(cell).is_some() {
            return None;
        }
        Some(self.candidates_mask(cell) & (1 << digit_of(candidate)) != 0)
    }

    /// Every remaining candidate of `digit`.
    fn candidates_of(&self, digit: Digit) -> CandidateMap {
        (0..CELLS as Cell)
            .filter(|&cell| self.candidates_mask(cell) & (1 << digit) != 0)
            .map(|cell| candidate_of(cell, digit))
            .collect()
    }

    /// Apply the assertion carried by `node`.
    fn apply(&mut self, node: &Node);
}

/// Dual-indexed candidate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFabric {
    /// Per-cell candidate digits (0 for filled cells)
    pub cell_cands: [Mask; CELLS],
    /// Placed digits (None if empty)
    pub values: [Option<Digit>; CELLS],
    /// house_digit_cells[house][digit] = bitmask of positions within that house
    /// still holding `digit`
    pub house_digit_cells: [[u16; DIGITS]; HOUSES],
    /// Whether the digit was part of the puzzle string
    pub is_given: [bool; CELLS],
}

impl CandidateFabric {
    /// A blank grid where every candidate is possible.
    pub fn empty() -> Self {
        let mut fab = CandidateFabric {
            cell_cands: [ALL_DIGITS; CELLS],
            values: [None; CELLS],
            house_digit_cells: [[0; DIGITS]; HOUSES],
            is_given: [false; CELLS],
        };
        fab.rebuild_index();
        fab
    }

    /// Parse an 81-character puzzle (`0` or `.` for blanks) and derive candidates
    /// from the placed digits.
    pub fn from_string(puzzle: &str) -> Result<Self> {
        let chars: Vec<char> = puzzle.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != CELLS {
            return Err(ChainError::InvalidPuzzle(format!(
                "expected {} cells, found {}",
                CELLS,
                chars.len()
            )));
        }

        let mut fab = Self::empty();
        for (cell, ch) in chars.into_iter().enumerate() {
            match ch {
                '0' | '.' => {}
                '1'..='9' => {
                    let digit = ch as u8 - b'1';
                    fab.place(cell as Cell, digit);
                    fab.is_given[cell] = true;
                }
                other => {
                    return Err(ChainError::InvalidPuzzle(format!(
                        "unexpected character {:?} at cell {}",
                        other, cell
                    )))
                }
            }
        }
        Ok(fab)
    }

    /// Place `digit` in `cell` and strip it from the peer cells.
    pub fn place(&mut self, cell: Cell, digit: Digit) {
        self.values[cell as usize] = Some(digit);
        self.cell_cands[cell as usize] = 0;
        for house in cell_houses(cell) {
            for peer in house_cells(house) {
                self.cell_cands[peer as usize] &= !(1 << digit);
            }
        }
        self.rebuild_index();
    }

    /// Remove a single candidate. Returns whether it was present.
    pub fn eliminate(&mut self, candidate: Candidate) -> bool {
        let (cell, digit) = (cell_of(candidate) as usize, digit_of(candidate));
        let present = self.cell_cands[cell] & (1 << digit) != 0;
        if present {
            self.cell_cands[cell] &= !(1 << digit);
            self.rebuild_index();
        }
        present
    }

    /// Overwrite the candidate digits of an empty cell.
    pub fn set_candidates(&mut self, cell: Cell, mask: Mask) {
        if self.values[cell as usize].is_none() {
            self.cell_cands[cell as usize] = mask & ALL_DIGITS;
            self.rebuild_index();
        }
    }

    fn rebuild_index(&mut self) {
        self.house_digit_cells = [[0; DIGITS]; HOUSES];
        for house in 0..HOUSES as House {
            for (pos, cell) in house_cells(house).into_iter().enumerate() {
                for digit in mask_digits(self.cell_cands[cell as usize]) {
                    self.house_digit_cells[house as usize][digit as usize] |= 1 << pos;
                }
            }
        }
    }

    /// Cells of `house` still holding `digit`.
    pub fn house_cells_with_candidate(&self, house: House, digit: Digit) -> Vec<Cell> {
        let mask = self.house_digit_cells[house as usize][digit as usize];
        house_cells(house)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, cell)| cell)
            .collect()
    }

    /// Number of cells in `house` holding `digit`.
    #[inline]
    pub fn house_candidate_count(&self, house: House, digit: Digit) -> u32 {
        self.house_digit_cells[house as usize][digit as usize].count_ones()
    }

    #[inline]
    pub fn candidate_count(&self, cell: Cell) -> u32 {
        self.cell_cands[cell as usize].count_ones()
    }

    /// All remaining candidates.
    pub fn candidates(&self) -> CandidateMap {
        (0..CELLS as Cell)
            .flat_map(|cell| {
                mask_digits(self.cell_cands[cell as usize]).map(move |d| candidate_of(cell, d))
            })
            .collect()
    }
}

impl Grid for CandidateFabric {
    fn digit_at(&self, cell: Cell) -> Option<Digit> {
        self.values[cell as usize]
    }

    fn candidates_mask(&self, cell: Cell) -> Mask {
        self.cell_cands[cell as usize]
    }

    fn apply(&mut self, node: &Node) {
        if !node.is_on {
            for candidate in node.map.iter() {
                self.cell_cands[cell_of(candidate) as usize] &= !(1 << digit_of(candidate));
            }
            self.rebuild_index();
            return;
        }

        match node.candidate() {
            Some(candidate) => self.place(cell_of(candidate), digit_of(candidate)),
            None => {
                for candidate in node.map.peer_intersection().iter() {
                    if node.digits() & (1 << digit_of(candidate)) != 0 {
                        self.cell_cands[cell_of(candidate) as usize] &=
                            !(1 << digit_of(candidate));
                    }
                }
                self.rebuild_index();
            }
        }
    }
}
