//! Chaining rules: strategies that contribute links and view nodes.
//!
//! Only the two elementary rules live here. Advanced rules (almost locked
//! sets, fish, rectangles) are supplied by the caller and registered under
//! their [`LinkType`] flag.

use std::collections::BTreeMap;

use log::debug;

use crate::candidate::{candidate_of, house_cells, mask_digits, Cell, Digit, HOUSES};
use crate::fabric::Grid;
use crate::link::{JustificationPattern, Link, LinkPools, LinkType};
use crate::logging::targets;
use crate::node::Node;
use crate::view::{ColorIdentifier, View, ViewNode};

/// What a rule sees while a chain paints its view.
pub struct ViewNodeContext<'a> {
    pub grid: &'a dyn Grid,
    pub nodes: &'a [Node],
    pub links: &'a [Link],
    pub view: &'a mut View,
    /// Next free almost-locked-set colour
    pub current_als_index: usize,
}

/// A link source.
pub trait ChainingRule {
    fn link_type(&self) -> LinkType;

    /// Add every link the rule finds in `grid`.
    fn collect_links(&self, grid: &dyn Grid, pools: &mut LinkPools);

    /// Extra view nodes for a chain. Most rules draw nothing beyond the links.
    fn view_nodes(&self, _context: &mut ViewNodeContext<'_>) {}
}

/// Registered rules, keyed and iterated by flag.
#[derive(Default)]
pub struct ChainingRules {
    rules: BTreeMap<LinkType, Box<dyn ChainingRule>>,
}

impl ChainingRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-digit and single-cell rules.
    pub fn elementary() -> Self {
        let mut rules = Self::new();
        rules.register(Box::new(SingleDigitRule));
        rules.register(Box::new(SingleCellRule));
        rules
    }

    /// Replaces any rule already registered under the same flag.
    pub fn register(&mut self, rule: Box<dyn ChainingRule>) {
        self.rules.insert(rule.link_type(), rule);
    }

    pub fn get(&self, link_type: LinkType) -> Option<&dyn ChainingRule> {
        self.rules.get(&link_type).map(|rule| rule.as_ref())
    }

    pub fn supported(&self) -> LinkType {
        self.rules
            .keys()
            .fold(LinkType::NONE, |acc, &link_type| acc | link_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ChainingRule> {
        self.rules.values().map(|rule| rule.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every registered rule into a fresh pair of dictionaries.
    pub fn collect_links(&self, grid: &dyn Grid) -> LinkPools {
        let mut pools = LinkPools::new();
        for rule in self.iter() {
            rule.collect_links(grid, &mut pools);
        }
        debug!(
            target: targets::LINKS,
            "collected {} strong and {} weak entries from {} rules",
            pools.strong.entry_count(),
            pools.weak.entry_count(),
            self.len()
        );
        pools
    }
}

/// Record `a` and `b` as a strong pair (`!a => b`, `!b => a`) and a weak
/// pair (`a => !b`, `b => !a`).
fn add_conjugate(pools: &mut LinkPools, a: Node, b: Node) {
    pools.strong.add_entry(!a, b, true, None);
    pools.strong.add_entry(!b, a, true, None);
    add_exclusive(pools, a, b);
}

/// Record `a => !b` and `b => !a`.
fn add_exclusive(pools: &mut LinkPools, a: Node, b: Node) {
    pools.weak.add_entry(a, !b, false, None);
    pools.weak.add_entry(b, !a, false, None);
}

// ==================== Single digit ====================

/// Conjugate pairs in a house are strong; any two cells of a house holding
/// the same digit are weak.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleDigitRule;

impl ChainingRule for SingleDigitRule {
    fn link_type(&self) -> LinkType {
        LinkType::SINGLE_DIGIT
    }

    fn collect_links(&self, grid: &dyn Grid, pools: &mut LinkPools) {
        for house in 0..HOUSES as u8 {
            for digit in 0..9 as Digit {
                let cells: Vec<Cell> = house_cells(house)
                    .into_iter()
                    .filter(|&cell| grid.exists(candidate_of(cell, digit)) == Some(true))
                    .collect();
                if cells.len() < 2 {
                    continue;
                }
                let node = |cell: Cell| Node::on(candidate_of(cell, digit));
                if cells.len() == 2 {
                    add_conjugate(pools, node(cells[0]), node(cells[1]));
                    continue;
                }
                for i in 0..cells.len() {
                    for j in (i + 1)..cells.len() {
                        add_exclusive(pools, node(cells[i]), node(cells[j]));
                    }
                }
            }
        }
    }
}

// ==================== Single cell ====================

/// The two candidates of a bivalue cell are strong; any two candidates of one
/// cell are weak.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleCellRule;

impl ChainingRule for SingleCellRule {
    fn link_type(&self) -> LinkType {
        LinkType::SINGLE_CELL
    }

    fn collect_links(&self, grid: &dyn Grid, pools: &mut LinkPools) {
        for cell in 0..81 as Cell {
            if grid.digit_at(cell).is_some() {
                continue;
            }
            let digits: Vec<Digit> = mask_digits(grid.candidates_mask(cell)).collect();
            let node = |digit: Digit| Node::on(candidate_of(cell, digit));
            if digits.len() == 2 {
                add_conjugate(pools, node(digits[0]), node(digits[1]));
                continue;
            }
            for i in 0..digits.len() {
                for j in (i + 1)..digits.len() {
                    add_exclusive(pools, node(digits[i]), node(digits[j]));
                }
            }
        }
    }
}

// ==================== Externally found patterns ====================

/// Grouped links found by an outside search and backed by a pattern, such as
/// an almost locked set. The rule replays them into the pools and paints the
/// backing candidates of every link a chain actually uses.
#[derive(Debug, Clone)]
pub struct PatternLinksRule {
    link_type: LinkType,
    links: Vec<Link>,
}

impl PatternLinksRule {
    pub fn new(link_type: LinkType) -> Self {
        Self {
            link_type,
            links: Vec::new(),
        }
    }

    pub fn push(&mut self, first: Node, second: Node, is_strong: bool, pattern: JustificationPattern) {
        self.links
            .push(Link::new(first, second, is_strong).with_pattern(Some(pattern)));
    }
}

impl ChainingRule for PatternLinksRule {
    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn collect_links(&self, _grid: &dyn Grid, pools: &mut LinkPools) {
        for link in &self.links {
            pools.dictionary_mut(link.inference()).add_entry(
                link.first,
                link.second,
                link.is_strong,
                link.pattern.clone(),
            );
        }
    }

    fn view_nodes(&self, context: &mut ViewNodeContext<'_>) {
        for link in context.links {
            let Some(pattern) = &link.pattern else {
                continue;
            };
            if !pattern.rule.intersects(self.link_type) {
                continue;
            }
            let color = if self.link_type.contains(LinkType::ALMOST_LOCKED_SETS) {
                let color = ColorIdentifier::AlmostLockedSet(context.current_als_index);
                context.current_als_index += 1;
                color
            } else {
                ColorIdentifier::Auxiliary3
            };
            for candidate in pattern.map.iter() {
                context.view.push(ViewNode::Candidate { color, candidate });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateMap;
    use crate::chain::{AlternatingInferenceChain, ChainPattern};
    use crate::fabric::CandidateFabric;

    #[test]
    fn test_registry_keys() {
        let rules = ChainingRules::elementary();
        assert_eq!(rules.len(), 2);
        assert!(rules.get(LinkType::SINGLE_CELL).is_some());
        assert_eq!(rules.supported(), LinkType::SINGLE_DIGIT | LinkType::SINGLE_CELL);
    }

    #[test]
    fn test_single_digit_conjugate_pair() {
        let mut grid = CandidateFabric::empty();
        // Digit 1 only at r1c1 and r1c2 in row 1.
        for cell in 2..9 {
            grid.eliminate(candidate_of(cell, 0));
        }
        let mut pools = LinkPools::new();
        SingleDigitRule.collect_links(&grid, &mut pools);
        let a = Node::on(candidate_of(0, 0));
        let b = Node::on(candidate_of(1, 0));
        assert!(pools.strong.contains(&!a, &b));
        assert!(pools.weak.contains(&a, &!b));
        // Column 1 still has nine cells for digit 1: weak only.
        let below = Node::on(candidate_of(9, 0));
        assert!(!pools.strong.contains(&!a, &below));
        assert!(pools.weak.contains(&a, &!below));
    }

    #[test]
    fn test_single_cell_bivalue() {
        let mut grid = CandidateFabric::empty();
        grid.set_candidates(40, 0b101);
        let mut pools = LinkPools::new();
        SingleCellRule.collect_links(&grid, &mut pools);
        let a = Node::on(candidate_of(40, 0));
        let b = Node::on(candidate_of(40, 2));
        assert!(pools.strong.contains(&!a, &b));
        assert!(pools.strong.contains(&!b, &a));
        let wide = Node::on(candidate_of(41, 0));
        assert!(!pools.strong.contains(&!wide, &Node::on(candidate_of(41, 1))));
    }

    #[test]
    fn test_pattern_rule_paints_als() {
        let grid = CandidateFabric::empty();
        let first = Node::off(candidate_of(0, 1));
        let second = Node::on(candidate_of(1, 2));
        let mut rule = PatternLinksRule::new(LinkType::ALMOST_LOCKED_SETS);
        rule.push(
            first,
            second,
            true,
            JustificationPattern {
                rule: LinkType::ALMOST_LOCKED_SETS,
                map: [candidate_of(0, 1), candidate_of(0, 2)].into_iter().collect::<CandidateMap>(),
            },
        );
        let mut rules = ChainingRules::new();
        rules.register(Box::new(rule));
        let pools = rules.collect_links(&grid);
        assert_eq!(pools.strong.pattern_count(), 2);

        let chain = AlternatingInferenceChain::from_nodes(vec![
            first,
            second,
            Node::off(candidate_of(10, 2)),
            Node::on(candidate_of(19, 2)),
        ])
        .unwrap();
        let mut als_index = 0;
        let views = chain.views(&grid, &pools, &rules, &mut als_index);
        assert_eq!(views.len(), 1);
        assert_eq!(als_index, 1);
        let als_cells = views[0]
            .iter()
            .filter(|node| node.color() == ColorIdentifier::AlmostLockedSet(0))
            .count();
        assert_eq!(als_cells, 2);
    }
}
