//! # Genesis Module
//!
//! Initial allocation applied once at boot, before the node accepts
//! transactions.
//!
//! ## Initialization Sequence
//!
//! 1. Install every registered module's initial state (version 0)
//! 2. Build genesis deltas from [`GenesisConfig`]
//! 3. Commit them per module, each as one atomic ChangeContext

pub mod builder;

pub use builder::{GenesisAllocation, GenesisBuilder, GenesisConfig, GenesisError};
