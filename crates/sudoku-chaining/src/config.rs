//! Construction options for chains.

use serde::{Deserialize, Serialize};

/// Configuration for chain construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainingConfig {
    /// Whether constructors may reverse a chain into canonical direction
    pub auto_reverse: bool,
    /// Upper bound on parent hops taken by a single walk
    pub max_walk_length: usize,
    /// Whether branches are built from every parent (multi-parent expansion)
    pub dynamic: bool,
}

impl Default for ChainingConfig {
    fn default() -> Self {
        Self {
            auto_reverse: true,
            // Two hops per candidate covers every simple ON/OFF path.
            max_walk_length: 2 * crate::candidate::CANDIDATES,
            dynamic: false,
        }
    }
}

impl ChainingConfig {
    /// Default options with dynamic expansion enabled.
    pub fn dynamic() -> Self {
        Self {
            dynamic: true,
            ..Self::default()
        }
    }

    /// Default options without canonical reversal.
    pub fn without_reversal() -> Self {
        Self {
            auto_reverse: false,
            ..Self::default()
        }
    }
}
