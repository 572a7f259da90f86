//! Error type shared by the chain engine.

use thiserror::Error;

use crate::candidate::Candidate;

pub type Result<T> = std::result::Result<T, ChainError>;

/// Failures surfaced by chain construction and forcing-chain assembly.
///
/// Search-time non-matches (a chain that is not a wing, an aggregate that is
/// not a finned chain) are reported through `bool`/`Option` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The parent walk from the terminal node never came back to it.
    #[error("loop walk did not close after {steps} steps")]
    UnclosedLoop { steps: usize },

    /// A parent walk took more hops than `max_walk_length` allows.
    #[error("parent walk exceeded {limit} steps")]
    WalkTooLong { limit: usize },

    /// A raw comparison tag outside the defined modes.
    #[error("invalid comparison mode: {0}")]
    InvalidComparison(u8),

    /// A node id that was never pushed into the arena.
    #[error("unknown node id: {0}")]
    UnknownNode(usize),

    /// A chain needs at least two nodes.
    #[error("chain has {0} node(s), at least 2 required")]
    EmptyChain(usize),

    /// A forcing-chain branch must begin at its key candidate.
    #[error("branch does not start at candidate {0}")]
    BranchStartMismatch(Candidate),

    /// Each key candidate owns exactly one branch.
    #[error("candidate {0} already has a branch")]
    DuplicateBranch(Candidate),

    /// The aggregate does not reduce to a single finned chain.
    #[error("forcing chains cannot be cast to a finned chain")]
    CannotCastFinnedChain,

    /// The puzzle string could not be parsed into a grid.
    #[error("invalid puzzle string: {0}")]
    InvalidPuzzle(String),
}
