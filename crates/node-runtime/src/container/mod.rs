//! # Node Container
//!
//! Configuration for every component a node wires together.

pub mod config;

pub use config::{ConfigError, NodeConfig};
