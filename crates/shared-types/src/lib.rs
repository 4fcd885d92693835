//! # Shared Types Crate
//!
//! This crate contains the records exchanged between the kernel components
//! and between nodes.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Transaction`, `Delta`, `ErrorKind` and the
//!   peer wire message are defined once, here.
//! - **Replayable**: a `Transaction` carries everything a peer needs to
//!   re-execute it (`module`, `handler`, `args`, `sender`, `cost_tier`).
//! - **Deterministic encoding**: all maps are `BTreeMap`s so serialised state
//!   is byte-identical across nodes.

pub mod entities;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use errors::*;
pub use ipc::*;
