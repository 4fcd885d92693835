//! # sd-03-module-registry
//!
//! Maps module names to their definition: version, initial module state,
//! user template, named handlers and named getters.
//!
//! ## Lifecycle
//!
//! ```text
//!  ModuleRegistryBuilder::register(def) ... register(def)
//!              │
//!              └── build() ──→ Arc<ModuleRegistry>   (immutable, lock-free lookups)
//! ```
//!
//! There is no global registry. The built `Arc<ModuleRegistry>` is passed
//! explicitly to the Transaction Engine and anything else that resolves
//! handlers.

pub mod domain;

pub use domain::*;
