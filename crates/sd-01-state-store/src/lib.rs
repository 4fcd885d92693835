//! # sd-01-state-store
//!
//! State Store for the Seed kernel.
//!
//! ## Role in System
//!
//! - **Pure data**: per module, a module-level state blob plus a map from
//!   user identity to that module's per-user blob
//! - **Copy-on-write snapshots**: readers pin an `Arc<StateSnapshot>`; a
//!   commit builds the next snapshot privately and swaps it in, so no reader
//!   ever observes a partially applied ChangeContext
//! - **Single writer**: commits are serialised and checked against the
//!   version the deltas were computed from
//!
//! ```text
//!  Container / ModuleView ──snapshot()──→ Arc<StateSnapshot v=N>
//!                                                │
//!  Transaction Engine ──commit(base=N, deltas)───┤
//!                                                ↓
//!                                   Arc<StateSnapshot v=N+1>  (swapped in)
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
