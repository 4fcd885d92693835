//! # Seed Kernel Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/       # Cross-crate scenarios
//!     ├── ledger.rs      # atomicity, conservation, no-ops, allowances
//!     ├── determinism.rs # identical roots, idempotent resync
//!     └── network.rs     # propagation, relay dedup, partition and resync
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sd-tests
//! cargo test -p sd-tests integration::network::
//!
//! # Benchmarks
//! cargo bench -p sd-tests
//! ```

pub mod integration;
