//! # Seed Modules
//!
//! The two modules a Seed node ships with:
//!
//! - [`seed`]: the SEED currency, balances and ERC20-style allowances
//! - [`cube_runner`]: player positions and walls on a bounded grid
//!
//! Handlers are pure functions of their `Container`. "Cannot perform" is an
//! empty ChangeContext, never an error.

pub mod cube_runner;
pub mod seed;

pub use cube_runner::{cube_runner_module, CUBE_RUNNER_MODULE};
pub use seed::{seed_module, SEED_MODULE};

use sd_03_module_registry::ModuleDefinition;

/// Every built-in module, in registration order.
pub fn builtin_modules() -> Vec<ModuleDefinition> {
    vec![seed_module(), cube_runner_module()]
}
