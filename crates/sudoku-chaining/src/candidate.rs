//! Candidate primitives: cells, digits, houses and the candidate bit-sets.
//!
//! A candidate is a (cell, digit) pair packed as `cell * 9 + digit`. Digits are
//! 0-based here and rendered 1-based by the formatters.
//!
//! House index convention: 0..8 = rows, 9..17 = columns, 18..26 = boxes.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};

use serde::{Deserialize, Serialize};

/// Packed (cell, digit) pair in `0..729`.
pub type Candidate = u16;
/// Linear cell index in `0..81`.
pub type Cell = u8;
/// 0-based digit in `0..9`.
pub type Digit = u8;
/// House index in `0..27`.
pub type House = u8;
/// Digit mask, bit `d` set means digit `d` is present.
pub type Mask = u16;

pub const CELLS: usize = 81;
pub const DIGITS: usize = 9;
pub const CANDIDATES: usize = 729;
pub const HOUSES: usize = 27;

pub const HOUSE_ROW_BASE: House = 0;
pub const HOUSE_COL_BASE: House = 9;
pub const HOUSE_BOX_BASE: House = 18;

/// Build a candidate from a cell and a 0-based digit.
#[inline]
pub fn candidate_of(cell: Cell, digit: Digit) -> Candidate {
    cell as Candidate * DIGITS as Candidate + digit as Candidate
}

/// Cell of a candidate.
#[inline]
pub fn cell_of(candidate: Candidate) -> Cell {
    (candidate / DIGITS as Candidate) as Cell
}

/// Digit of a candidate.
#[inline]
pub fn digit_of(candidate: Candidate) -> Digit {
    (candidate % DIGITS as Candidate) as Digit
}

/// Convert (row, col) to a linear cell index.
#[inline]
pub fn cell_index(row: usize, col: usize) -> Cell {
    (row * 9 + col) as Cell
}

/// Convert a linear cell index back to (row, col).
#[inline]
pub fn cell_pos(cell: Cell) -> (usize, usize) {
    (cell as usize / 9, cell as usize % 9)
}

/// The three houses a cell belongs to: `[row, column, box]`.
#[inline]
pub fn cell_houses(cell: Cell) -> [House; 3] {
    let (row, col) = cell_pos(cell);
    let box_idx = (row / 3) * 3 + col / 3;
    [
        HOUSE_ROW_BASE + row as House,
        HOUSE_COL_BASE + col as House,
        HOUSE_BOX_BASE + box_idx as House,
    ]
}

/// The 9 cells of a house.
pub fn house_cells(house: House) -> [Cell; 9] {
    let house = house as usize;
    if house < 9 {
        std::array::from_fn(|col| cell_index(house, col))
    } else if house < 18 {
        let col = house - 9;
        std::array::from_fn(|row| cell_index(row, col))
    } else {
        let box_idx = house - 18;
        let box_row = (box_idx / 3) * 3;
        let box_col = (box_idx % 3) * 3;
        std::array::from_fn(|i| cell_index(box_row + i / 3, box_col + i % 3))
    }
}

/// Check if two distinct cells share a row, column or box.
#[inline]
pub fn cells_see(a: Cell, b: Cell) -> bool {
    if a == b {
        return false;
    }
    let (ha, hb) = (cell_houses(a), cell_houses(b));
    ha[0] == hb[0] || ha[1] == hb[1] || ha[2] == hb[2]
}

/// Check if two distinct candidates exclude each other: same cell, or same digit
/// in cells sharing a house.
#[inline]
pub fn candidates_see(a: Candidate, b: Candidate) -> bool {
    if a == b {
        return false;
    }
    let (ca, cb) = (cell_of(a), cell_of(b));
    ca == cb || (digit_of(a) == digit_of(b) && cells_see(ca, cb))
}

/// Iterate the digits set in a mask, ascending.
pub fn mask_digits(mask: Mask) -> impl Iterator<Item = Digit> {
    (0..DIGITS as Digit).filter(move |&d| mask & (1 << d) != 0)
}

/// Whether exactly one digit is set.
#[inline]
pub fn mask_is_single(mask: Mask) -> bool {
    mask.is_power_of_two()
}

// ==================== CandidateMap ====================

const WORDS: usize = CANDIDATES.div_ceil(64);

/// Immutable-by-convention bit-set over the 729 candidates.
///
/// Ordering is lexicographic over the ascending candidate sequence, so a map
/// that is a strict prefix of another sorts first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CandidateMap {
    bits: [u64; WORDS],
}

impl CandidateMap {
    /// The empty map.
    pub const fn empty() -> Self {
        Self { bits: [0; WORDS] }
    }

    /// A one-candidate map.
    pub fn single(candidate: Candidate) -> Self {
        let mut map = Self::empty();
        map.insert(candidate);
        map
    }

    pub fn insert(&mut self, candidate: Candidate) {
        let c = candidate as usize;
        self.bits[c / 64] |= 1 << (c % 64);
    }

    pub fn remove(&mut self, candidate: Candidate) {
        let c = candidate as usize;
        self.bits[c / 64] &= !(1 << (c % 64));
    }

    #[inline]
    pub fn contains(&self, candidate: Candidate) -> bool {
        let c = candidate as usize;
        c < CANDIDATES && self.bits[c / 64] & (1 << (c % 64)) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Whether the two maps share at least one candidate.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.bits.iter().zip(&other.bits).any(|(a, b)| a & b != 0)
    }

    /// Iterate candidates in ascending order.
    pub fn iter(&self) -> CandidateIter<'_> {
        CandidateIter {
            map: self,
            word: 0,
            current: self.bits[0],
        }
    }

    /// Smallest candidate, if any.
    pub fn first(&self) -> Option<Candidate> {
        self.iter().next()
    }

    /// The sole candidate when the map holds exactly one.
    pub fn as_single(&self) -> Option<Candidate> {
        if self.len() == 1 {
            self.first()
        } else {
            None
        }
    }

    /// Union of the digits used by the candidates.
    pub fn digits(&self) -> Mask {
        self.iter().fold(0, |acc, c| acc | 1 << digit_of(c))
    }

    /// Cells touched by the candidates.
    pub fn cells(&self) -> CellMap {
        self.iter().map(cell_of).collect()
    }

    /// Candidates of a single digit, as cells.
    pub fn cells_of_digit(&self, digit: Digit) -> CellMap {
        self.iter()
            .filter(|&c| digit_of(c) == digit)
            .map(cell_of)
            .collect()
    }

    /// Candidates seeing every candidate of this map. Members are never included.
    pub fn peer_intersection(&self) -> CandidateMap {
        let mut iter = self.iter();
        let Some(first) = iter.next() else {
            return CandidateMap::empty();
        };
        let mut result = candidate_peers(first);
        for candidate in iter {
            result &= candidate_peers(candidate);
            if result.is_empty() {
                break;
            }
        }
        result
    }
}

/// The 28 candidates excluded by `candidate`: 8 in its cell, 20 of its digit in peer cells.
pub fn candidate_peers(candidate: Candidate) -> CandidateMap {
    let (cell, digit) = (cell_of(candidate), digit_of(candidate));
    let mut result = CandidateMap::empty();
    for d in 0..DIGITS as Digit {
        if d != digit {
            result.insert(candidate_of(cell, d));
        }
    }
    for house in cell_houses(cell) {
        for other in house_cells(house) {
            if other != cell {
                result.insert(candidate_of(other, digit));
            }
        }
    }
    result
}

impl PartialOrd for CandidateMap {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CandidateMap {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl fmt::Debug for CandidateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOr for CandidateMap {
    type Output = Self;

    fn bitor(mut self, rhs: Self) -> Self {
        self |= rhs;
        self
    }
}

impl BitOrAssign for CandidateMap {
    fn bitor_assign(&mut self, rhs: Self) {
        for (a, b) in self.bits.iter_mut().zip(rhs.bits) {
            *a |= b;
        }
    }
}

impl BitAnd for CandidateMap {
    type Output = Self;

    fn bitand(mut self, rhs: Self) -> Self {
        self &= rhs;
        self
    }
}

impl BitAndAssign for CandidateMap {
    fn bitand_assign(&mut self, rhs: Self) {
        for (a, b) in self.bits.iter_mut().zip(rhs.bits) {
            *a &= b;
        }
    }
}

impl Sub for CandidateMap {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        for (a, b) in self.bits.iter_mut().zip(rhs.bits) {
            *a &= !b;
        }
        self
    }
}

impl FromIterator<Candidate> for CandidateMap {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let mut map = CandidateMap::empty();
        map.extend(iter);
        map
    }
}

impl Extend<Candidate> for CandidateMap {
    fn extend<I: IntoIterator<Item = Candidate>>(&mut self, iter: I) {
        for candidate in iter {
            self.insert(candidate);
        }
    }
}

impl From<Candidate> for CandidateMap {
    fn from(candidate: Candidate) -> Self {
        Self::single(candidate)
    }
}

impl<'a> IntoIterator for &'a CandidateMap {
    type Item = Candidate;
    type IntoIter = CandidateIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over a [`CandidateMap`].
pub struct CandidateIter<'a> {
    map: &'a CandidateMap,
    word: usize,
    current: u64,
}

impl Iterator for CandidateIter<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some((self.word * 64 + bit) as Candidate);
            }
            self.word += 1;
            if self.word >= WORDS {
                return None;
            }
            self.current = self.map.bits[self.word];
        }
    }
}

// ==================== CellMap ====================

/// Bit-set over the 81 cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellMap(u128);

impl CellMap {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, cell: Cell) {
        self.0 |= 1 << cell;
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.0 & (1 << cell) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..CELLS as Cell).filter(move |&c| self.contains(c))
    }

    pub fn first(&self) -> Option<Cell> {
        (self.0 != 0).then(|| self.0.trailing_zeros() as Cell)
    }

    /// Bit mask over the 27 houses containing every cell of the map.
    pub fn shared_houses(&self) -> u32 {
        if self.is_empty() {
            return 0;
        }
        self.iter().fold(u32::MAX >> 5, |acc, cell| {
            let houses = cell_houses(cell);
            acc & houses.iter().fold(0u32, |m, &h| m | 1 << h)
        })
    }

    /// Lowest house containing every cell, if one exists.
    pub fn first_shared_house(&self) -> Option<House> {
        let houses = self.shared_houses();
        (houses != 0).then(|| houses.trailing_zeros() as House)
    }

    /// Cells seeing every cell of the map. Members are never included.
    pub fn peer_intersection(&self) -> CellMap {
        if self.is_empty() {
            return CellMap::empty();
        }
        (0..CELLS as Cell)
            .filter(|&cell| self.iter().all(|member| cells_see(cell, member)))
            .collect()
    }
}

impl FromIterator<Cell> for CellMap {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        let mut map = CellMap::empty();
        for cell in iter {
            map.insert(cell);
        }
        map
    }
}

impl Not for CellMap {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & ((1u128 << CELLS) - 1))
    }
}

impl fmt::Debug for CellMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
