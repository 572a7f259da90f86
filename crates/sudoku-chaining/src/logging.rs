//! Log targets used by the chain engine.
//!
//! The crate only emits records through the [log] facade; no logger is
//! installed here.

/// Targets to be used within a [log]! macro.
pub mod targets {
    /// Parent walks and chain materialization
    pub const CONSTRUCTION: &str = "chain_construction";

    /// Canonical direction and reversal
    pub const CANONICAL: &str = "chain_canonical";

    /// Link dictionaries and pattern pools
    pub const LINKS: &str = "chain_links";

    /// Forcing-chain aggregates
    pub const FORCING: &str = "forcing_chains";
}
