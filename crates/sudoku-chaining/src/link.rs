//! Links between nodes and the dictionaries that accumulate them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::candidate::{cell_of, CandidateMap};
use crate::chain::ChainComparison;
use crate::fabric::Grid;
use crate::logging::targets;
use crate::node::{Node, NodeComparison};

// ==================== Inference ====================

/// Strength of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inference {
    /// At least one end is true.
    Strong,
    /// At most one end is true.
    Weak,
}

impl Inference {
    /// Inference of link `index` when index 0 is strong.
    #[inline]
    pub fn from_parity(index: usize) -> Self {
        if index & 1 == 0 {
            Inference::Strong
        } else {
            Inference::Weak
        }
    }

    #[inline]
    pub fn is_strong(self) -> bool {
        self == Inference::Strong
    }
}

// ==================== LinkType ====================

/// Bit flags naming the rules that may justify a link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct LinkType(u32);

impl LinkType {
    pub const NONE: LinkType = LinkType(0);
    pub const SINGLE_DIGIT: LinkType = LinkType(1 << 0);
    pub const SINGLE_CELL: LinkType = LinkType(1 << 1);
    pub const LOCKED_CANDIDATES: LinkType = LinkType(1 << 2);
    pub const ALMOST_LOCKED_SETS: LinkType = LinkType(1 << 3);
    pub const KRAKEN_NORMAL_FISH: LinkType = LinkType(1 << 4);
    pub const XYZ_WING: LinkType = LinkType(1 << 5);
    pub const ALMOST_UNIQUE_RECTANGLE: LinkType = LinkType(1 << 6);
    pub const ALMOST_AVOIDABLE_RECTANGLE: LinkType = LinkType(1 << 7);

    const NAMES: [(LinkType, &'static str); 8] = [
        (Self::SINGLE_DIGIT, "SingleDigit"),
        (Self::SINGLE_CELL, "SingleCell"),
        (Self::LOCKED_CANDIDATES, "LockedCandidates"),
        (Self::ALMOST_LOCKED_SETS, "AlmostLockedSets"),
        (Self::KRAKEN_NORMAL_FISH, "KrakenNormalFish"),
        (Self::XYZ_WING, "XyzWing"),
        (Self::ALMOST_UNIQUE_RECTANGLE, "AlmostUniqueRectangle"),
        (Self::ALMOST_AVOIDABLE_RECTANGLE, "AlmostAvoidableRectangle"),
    ];

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn contains(self, other: LinkType) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn intersects(self, other: LinkType) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The individual flags set, lowest first.
    pub fn iter(self) -> impl Iterator<Item = LinkType> {
        Self::NAMES
            .into_iter()
            .map(|(flag, _)| flag)
            .filter(move |&flag| self.contains(flag))
    }
}

impl BitOr for LinkType {
    type Output = LinkType;

    fn bitor(self, rhs: LinkType) -> LinkType {
        LinkType(self.0 | rhs.0)
    }
}

impl BitOrAssign for LinkType {
    fn bitor_assign(&mut self, rhs: LinkType) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "LinkType(NONE)");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "LinkType({})", names.join(" | "))
    }
}

// ==================== Link ====================

/// The advanced structure backing a grouped link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JustificationPattern {
    pub rule: LinkType,
    /// Candidates the structure is made of
    pub map: CandidateMap,
}

/// A directed strong or weak edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub first: Node,
    pub second: Node,
    pub is_strong: bool,
    pub pattern: Option<JustificationPattern>,
}

impl Link {
    pub fn new(first: Node, second: Node, is_strong: bool) -> Self {
        Self {
            first,
            second,
            is_strong,
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: Option<JustificationPattern>) -> Self {
        self.pattern = pattern;
        self
    }

    /// Compare ends and strength; the pattern never takes part.
    pub fn equals(&self, other: &Link, mode: ChainComparison) -> bool {
        if self.is_strong != other.is_strong {
            return false;
        }
        let forward = self.first == other.first && self.second == other.second;
        match mode {
            ChainComparison::Directed => forward,
            ChainComparison::Undirected => {
                forward || (self.first == other.second && self.second == other.first)
            }
        }
    }

    /// Both ends are single candidates of one bivalue cell.
    pub fn is_bivalue_cell_link<G: Grid + ?Sized>(&self, grid: &G) -> bool {
        match (self.first.candidate(), self.second.candidate()) {
            (Some(a), Some(b)) => {
                let cell = cell_of(a);
                cell == cell_of(b) && grid.candidates_mask(cell).count_ones() == 2
            }
            _ => false,
        }
    }

    /// Either end spans several candidates, or an advanced pattern backs the link.
    pub fn is_strictly_grouped(&self) -> bool {
        self.first.is_grouped() || self.second.is_grouped() || self.pattern.is_some()
    }

    pub fn inference(&self) -> Inference {
        if self.is_strong {
            Inference::Strong
        } else {
            Inference::Weak
        }
    }
}

/// Pool key: the smaller node first, so both orientations share one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct LinkKey {
    low: Node,
    high: Node,
    is_strong: bool,
}

impl LinkKey {
    fn new(a: Node, b: Node, is_strong: bool) -> Self {
        let (low, high) = if a.compare(&b, NodeComparison::IncludeState).is_le() {
            (a, b)
        } else {
            (b, a)
        };
        Self {
            low,
            high,
            is_strong,
        }
    }
}

// ==================== LinkDictionary ====================

/// Adjacency map of one inference kind plus the pattern pool.
///
/// Every entry is stored together with its negated mirror, so the OFF graph
/// never has to be derived separately. Each search thread should own its own
/// dictionary and combine results with [`LinkDictionary::merge`].
#[derive(Debug, Clone, Default)]
pub struct LinkDictionary {
    entries: BTreeMap<Node, BTreeSet<Node>>,
    patterns: BTreeMap<LinkKey, JustificationPattern>,
}

impl LinkDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `a -> b` and `~a -> ~b`, with an optional justification for both.
    pub fn add_entry(
        &mut self,
        a: Node,
        b: Node,
        is_strong: bool,
        pattern: Option<JustificationPattern>,
    ) {
        self.entries.entry(a).or_default().insert(b);
        self.entries.entry(!a).or_default().insert(!b);

        if let Some(pattern) = pattern {
            self.patterns
                .entry(LinkKey::new(a, b, is_strong))
                .or_insert_with(|| pattern.clone());
            self.patterns
                .entry(LinkKey::new(!a, !b, is_strong))
                .or_insert(pattern);
        }
    }

    /// Nodes reachable from `node`.
    pub fn get(&self, node: &Node) -> Option<&BTreeSet<Node>> {
        self.entries.get(node)
    }

    pub fn contains(&self, a: &Node, b: &Node) -> bool {
        self.entries.get(a).is_some_and(|sinks| sinks.contains(b))
    }

    /// Pattern recorded for the undirected edge `a`–`b`.
    pub fn pattern(&self, a: Node, b: Node, is_strong: bool) -> Option<&JustificationPattern> {
        self.patterns.get(&LinkKey::new(a, b, is_strong))
    }

    /// Number of source nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of (source, target) pairs.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Node, &BTreeSet<Node>)> {
        self.entries.iter()
    }

    /// Union with `other`. Patterns already present here are kept.
    pub fn merge(&mut self, other: &LinkDictionary) {
        let before = self.entry_count();
        for (source, sinks) in &other.entries {
            self.entries
                .entry(*source)
                .or_default()
                .extend(sinks.iter().copied());
        }
        for (key, pattern) in &other.patterns {
            self.patterns.entry(*key).or_insert_with(|| pattern.clone());
        }
        debug!(
            target: targets::LINKS,
            "merged dictionary: {} -> {} entries",
            before,
            self.entry_count()
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.patterns.clear();
    }
}

/// The strong and weak dictionaries queried when a chain derives its links.
#[derive(Debug, Clone, Default)]
pub struct LinkPools {
    pub strong: LinkDictionary,
    pub weak: LinkDictionary,
}

impl LinkPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dictionary(&self, inference: Inference) -> &LinkDictionary {
        match inference {
            Inference::Strong => &self.strong,
            Inference::Weak => &self.weak,
        }
    }

    pub fn dictionary_mut(&mut self, inference: Inference) -> &mut LinkDictionary {
        match inference {
            Inference::Strong => &mut self.strong,
            Inference::Weak => &mut self.weak,
        }
    }

    /// Build the link `a -> b`, attaching the pattern recorded for it.
    pub fn link(&self, a: Node, b: Node, inference: Inference) -> Link {
        let is_strong = inference.is_strong();
        let pattern = self.dictionary(inference).pattern(a, b, is_strong).cloned();
        Link::new(a, b, is_strong).with_pattern(pattern)
    }

    pub fn merge(&mut self, other: &LinkPools) {
        self.strong.merge(&other.strong);
        self.weak.merge(&other.weak);
    }
}
