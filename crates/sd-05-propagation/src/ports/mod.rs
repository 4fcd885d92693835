//! Ports for the propagation layer.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
