//! # Event Handlers
//!
//! Long-running consumers of the node's event bus.

pub mod metrics;

pub use metrics::{record_event, record_propagation, MetricsHandler};
