//! Mode-tagged equality, hashing and ordering over node sequences.
//!
//! Equality and hashing are both defined from the same per-node projection
//! ([`Node::compare`] / [`Node::hash_into`] under a [`NodeComparison`]), so a
//! new mode cannot make them drift apart.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use super::ChainComparison;
use crate::node::{Node, NodeComparison};

#[inline]
fn same(a: &Node, b: &Node, mode: NodeComparison) -> bool {
    a.equals(b, mode)
}

fn fold_hash<'a>(nodes: impl Iterator<Item = &'a Node>, mode: NodeComparison) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut count = 0usize;
    for node in nodes {
        node.hash_into(&mut hasher, mode);
        count += 1;
    }
    hasher.write_usize(count);
    hasher.finish()
}

fn sorted_copy(nodes: &[Node], mode: NodeComparison) -> Vec<Node> {
    let mut sorted = nodes.to_vec();
    sorted.sort_by(|a, b| a.compare(b, mode));
    sorted
}

// ==================== Open chains ====================

/// Forward match, or (undirected only) a match against the reversed sequence.
pub fn open_equals(
    a: &[Node],
    b: &[Node],
    node_mode: NodeComparison,
    chain_mode: ChainComparison,
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let forward = a.iter().zip(b).all(|(x, y)| same(x, y, node_mode));
    match chain_mode {
        ChainComparison::Directed => forward,
        ChainComparison::Undirected => {
            forward || a.iter().zip(b.iter().rev()).all(|(x, y)| same(x, y, node_mode))
        }
    }
}

/// Undirected hashing folds a sorted copy so mirror images collide.
pub fn open_hash(nodes: &[Node], node_mode: NodeComparison, chain_mode: ChainComparison) -> u64 {
    match chain_mode {
        ChainComparison::Directed => fold_hash(nodes.iter(), node_mode),
        ChainComparison::Undirected => fold_hash(sorted_copy(nodes, node_mode).iter(), node_mode),
    }
}

/// Length first, then chains whose first node is the negation of their last
/// node, then node by node.
pub fn open_compare(a: &[Node], b: &[Node], node_mode: NodeComparison) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| {
            // true sorts first
            is_self_constraint(b).cmp(&is_self_constraint(a))
        })
        .then_with(|| node_by_node(a.iter(), b.iter(), node_mode))
}

/// First node is the exact negation of the last one.
pub fn is_self_constraint(nodes: &[Node]) -> bool {
    match (nodes.first(), nodes.last()) {
        (Some(first), Some(last)) if nodes.len() >= 2 => *first == !*last,
        _ => false,
    }
}

fn node_by_node<'a>(
    a: impl Iterator<Item = &'a Node>,
    b: impl Iterator<Item = &'a Node>,
    mode: NodeComparison,
) -> Ordering {
    for (x, y) in a.zip(b) {
        let result = x.compare(y, mode);
        if result != Ordering::Equal {
            return result;
        }
    }
    Ordering::Equal
}

// ==================== Loops ====================

/// Direction in which `b` has to be read to line up with `a` once `a[0]`
/// and `b[offset]` are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Forward,
    Backward,
}

#[inline]
fn cyclic(b: &[Node], offset: usize, i: usize, walk: Walk) -> &Node {
    let n = b.len();
    match walk {
        Walk::Forward => &b[(offset + i) % n],
        Walk::Backward => &b[(offset + n - i % n) % n],
    }
}

/// Every (offset, direction) under which `b` could be a rotation of `a`.
fn alignments(
    a: &[Node],
    b: &[Node],
    node_mode: NodeComparison,
    chain_mode: ChainComparison,
) -> Vec<(usize, Walk)> {
    let mut result = Vec::new();
    if a.is_empty() || a.len() != b.len() {
        return result;
    }
    for offset in (0..b.len()).filter(|&j| same(&a[0], &b[j], node_mode)) {
        if a.len() == 1 {
            result.push((offset, Walk::Forward));
            continue;
        }
        if same(&a[1], cyclic(b, offset, 1, Walk::Forward), node_mode) {
            result.push((offset, Walk::Forward));
        }
        if chain_mode == ChainComparison::Undirected
            && same(&a[1], cyclic(b, offset, 1, Walk::Backward), node_mode)
        {
            result.push((offset, Walk::Backward));
        }
    }
    result
}

/// Equality up to rotation, plus reflection when undirected.
pub fn loop_equals(
    a: &[Node],
    b: &[Node],
    node_mode: NodeComparison,
    chain_mode: ChainComparison,
) -> bool {
    alignments(a, b, node_mode, chain_mode)
        .into_iter()
        .any(|(offset, walk)| {
            (0..a.len()).all(|i| same(&a[i], cyclic(b, offset, i, walk), node_mode))
        })
}

/// Undirected hashing sorts a copy; directed hashing folds the smallest
/// rotation so rotations still collide.
pub fn loop_hash(nodes: &[Node], node_mode: NodeComparison, chain_mode: ChainComparison) -> u64 {
    match chain_mode {
        ChainComparison::Undirected => fold_hash(sorted_copy(nodes, node_mode).iter(), node_mode),
        ChainComparison::Directed => {
            let start = smallest_rotation(nodes, node_mode);
            fold_hash(
                nodes[start..].iter().chain(nodes[..start].iter()),
                node_mode,
            )
        }
    }
}

/// Offset of the lexicographically smallest rotation. A loop may revisit a
/// candidate set, so every offset holding the minimum node is a contender.
fn smallest_rotation(nodes: &[Node], mode: NodeComparison) -> usize {
    let rotation = move |start: usize| nodes[start..].iter().chain(nodes[..start].iter());
    let Some(min) = nodes.iter().min_by(|a, b| a.compare(b, mode)) else {
        return 0;
    };
    (0..nodes.len())
        .filter(|&i| same(&nodes[i], min, mode))
        .min_by(|&i, &j| node_by_node(rotation(i), rotation(j), mode))
        .unwrap_or(0)
}

/// Length first, then node by node after lining `b` up with `a[0]`.
pub fn loop_compare(a: &[Node], b: &[Node], node_mode: NodeComparison) -> Ordering {
    let by_len = a.len().cmp(&b.len());
    if by_len != Ordering::Equal {
        return by_len;
    }
    match alignments(a, b, node_mode, ChainComparison::Undirected).first() {
        Some(&(offset, walk)) => {
            for i in 0..a.len() {
                let result = a[i].compare(cyclic(b, offset, i, walk), node_mode);
                if result != Ordering::Equal {
                    return result;
                }
            }
            Ordering::Equal
        }
        None => node_by_node(a.iter(), b.iter(), node_mode),
    }
}
