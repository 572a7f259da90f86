//! Forcing-chain aggregates: sets of branches that agree on a conclusion.

use serde::{Deserialize, Serialize};

use crate::candidate::Mask;
use crate::chain::{ChainPattern, UnnamedChain};
use crate::conclusion::Conclusion;
use crate::link::LinkPools;
use crate::view::{ColorIdentifier, View, ViewNode};

mod multiple;

pub use multiple::{MultipleForcingChains, MultipleForcingKind};

/// Two branches from opposite assumptions about one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryForcingChains {
    on: UnnamedChain,
    off: UnnamedChain,
    conclusion: Conclusion,
    is_contradiction: bool,
}

impl BinaryForcingChains {
    pub fn new(
        on: UnnamedChain,
        off: UnnamedChain,
        conclusion: Conclusion,
        is_contradiction: bool,
    ) -> Self {
        Self {
            on,
            off,
            conclusion,
            is_contradiction,
        }
    }

    pub fn on_branch(&self) -> &UnnamedChain {
        &self.on
    }

    pub fn off_branch(&self) -> &UnnamedChain {
        &self.off
    }

    pub fn branches(&self) -> [&UnnamedChain; 2] {
        [&self.on, &self.off]
    }

    pub fn conclusion(&self) -> Conclusion {
        self.conclusion
    }

    /// Whether one assumption leads to a contradiction rather than both
    /// leading to the same consequence.
    pub fn is_contradiction(&self) -> bool {
        self.is_contradiction
    }

    pub fn complexity(&self) -> usize {
        self.on.len() + self.off.len()
    }

    pub fn digits_mask(&self) -> Mask {
        self.on.digits_mask() | self.off.digits_mask()
    }

    /// One view per branch, each led by the assumed candidate.
    pub fn views(&self, pools: &LinkPools) -> Vec<View> {
        self.branches()
            .into_iter()
            .map(|branch| {
                let mut view = View::new();
                if let Some(candidate) = branch.first().candidate() {
                    view.push(ViewNode::Candidate {
                        color: ColorIdentifier::Auxiliary3,
                        candidate,
                    });
                }
                push_branch(&mut view, branch, pools, false);
                view
            })
            .collect()
    }
}

/// Paint a branch: its candidates, then its links.
///
/// Dynamic branches colour by state. Linear branches alternate, starting
/// from Normal.
pub(crate) fn push_branch(
    view: &mut View,
    branch: &UnnamedChain,
    pools: &LinkPools,
    skip_first_link: bool,
) {
    for (j, node) in branch.nodes().iter().enumerate() {
        let color = if branch.is_dynamic() {
            if node.is_on {
                ColorIdentifier::Normal
            } else {
                ColorIdentifier::Auxiliary1
            }
        } else if (j + 1) % 2 == 0 {
            ColorIdentifier::Auxiliary1
        } else {
            ColorIdentifier::Normal
        };
        for candidate in node.map.iter() {
            let item = ViewNode::Candidate { color, candidate };
            if !view.contains(&item) {
                view.push(item);
            }
        }
    }
    let skip = usize::from(skip_first_link);
    for link in branch.links(pools).iter().skip(skip) {
        let item = ViewNode::link(ColorIdentifier::Normal, link);
        if !view.contains(&item) {
            view.push(item);
        }
    }
}
