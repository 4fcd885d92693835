//! # Node Runtime Library
//!
//! Wires the Seed kernel into a runnable node. The `node-runtime` binary is
//! a local devnet built on top of this library.
//!
//! ## Layout
//!
//! - `container/` - node configuration
//! - `genesis/` - initial allocation applied at boot
//! - `adapters/` - peer network and engine sink implementations
//! - `handlers/` - event bus consumers (metrics)
//! - `node` - [`SeedNode`], the assembled node
//! - `poller` - periodic getter polling for full-state renderers

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod handlers;
pub mod node;
pub mod poller;

pub use adapters::{InMemoryNetwork, InMemoryPeerNetwork};
pub use container::config::{ConfigError, NodeConfig};
pub use genesis::{GenesisBuilder, GenesisConfig, GenesisError};
pub use node::{NodeError, SeedNode};
pub use poller::{GetterQuery, PollSnapshot, PollerConfig, ResyncPoller};
