//! Abstract highlight descriptors handed to a renderer.

use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, CandidateMap, Cell, House};
use crate::link::Link;

/// Palette slot a renderer maps to a concrete colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorIdentifier {
    Normal,
    Auxiliary1,
    Auxiliary2,
    Auxiliary3,
    /// Nth almost locked set drawn in the same picture
    AlmostLockedSet(usize),
}

/// One highlighted element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewNode {
    Candidate {
        color: ColorIdentifier,
        candidate: Candidate,
    },
    Cell {
        color: ColorIdentifier,
        cell: Cell,
    },
    House {
        color: ColorIdentifier,
        house: House,
    },
    Link {
        color: ColorIdentifier,
        first: CandidateMap,
        second: CandidateMap,
        is_strong: bool,
    },
}

impl ViewNode {
    pub fn link(color: ColorIdentifier, link: &Link) -> Self {
        ViewNode::Link {
            color,
            first: link.first.map,
            second: link.second.map,
            is_strong: link.is_strong,
        }
    }

    pub fn color(&self) -> ColorIdentifier {
        match self {
            ViewNode::Candidate { color, .. }
            | ViewNode::Cell { color, .. }
            | ViewNode::House { color, .. }
            | ViewNode::Link { color, .. } => *color,
        }
    }
}

pub type View = Vec<ViewNode>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::candidate_of;
    use crate::node::Node;

    #[test]
    fn test_link_node_keeps_maps() {
        let link = Link::new(Node::off(candidate_of(0, 0)), Node::on(candidate_of(1, 0)), true);
        let node = ViewNode::link(ColorIdentifier::Normal, &link);
        match node {
            ViewNode::Link {
                first,
                second,
                is_strong,
                ..
            } => {
                assert_eq!(first.as_single(), Some(0));
                assert_eq!(second.as_single(), Some(9));
                assert!(is_strong);
            }
            other => panic!("unexpected view node {other:?}"),
        }
    }

    #[test]
    fn test_json_encoding() {
        let node = ViewNode::Cell {
            color: ColorIdentifier::AlmostLockedSet(2),
            cell: 40,
        };
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"Cell":{"color":{"AlmostLockedSet":2},"cell":40}}"#);
        let back: ViewNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.color(), ColorIdentifier::AlmostLockedSet(2));
    }
}
