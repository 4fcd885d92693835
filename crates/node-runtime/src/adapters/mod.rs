//! # Adapters
//!
//! Implementations of the propagation layer's outbound ports.

pub mod engine_sink;
pub mod network;

pub use engine_sink::EngineSink;
pub use network::{Inbox, InMemoryNetwork, InMemoryPeerNetwork};
