//! Chain engine for Sudoku solving.
//!
//! Nodes assert that a candidate set is true or false. Searches push nodes
//! into a [`NodeArena`] with parent links; once a terminal node closes a
//! pattern, the chain is materialized by walking those parents. Finished
//! chains compare, hash and order under an explicit [`NodeComparison`] and
//! [`ChainComparison`], derive their links on demand from [`LinkPools`], and
//! report the conclusions they prove.

pub mod candidate;
pub mod chain;
pub mod conclusion;
pub mod config;
pub mod error;
pub mod fabric;
pub mod forcing;
pub mod format;
pub mod link;
pub mod logging;
pub mod node;
pub mod rules;
pub mod view;

pub use candidate::{Candidate, CandidateMap, Cell, CellMap, Digit, House, Mask};
pub use chain::{
    AlternatingInferenceChain, ChainComparison, ChainPattern, ContinuousNiceLoop, Loop, NamedChain,
    UnnamedChain,
};
pub use conclusion::{Conclusion, ConclusionKind, ConclusionSet};
pub use config::ChainingConfig;
pub use error::{ChainError, Result};
pub use fabric::{CandidateFabric, Grid};
pub use forcing::{BinaryForcingChains, MultipleForcingChains, MultipleForcingKind};
pub use link::{Inference, JustificationPattern, Link, LinkDictionary, LinkPools, LinkType};
pub use node::{ChainNode, MultiparentNode, Node, NodeArena, NodeComparison, NodeId, NodeSet};
pub use rules::{ChainingRule, ChainingRules};
pub use view::{ColorIdentifier, View, ViewNode};
