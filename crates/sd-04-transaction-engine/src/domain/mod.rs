pub mod config;
pub mod errors;
pub mod invariants;
pub mod typestate;

pub use config::*;
pub use errors::*;
pub use invariants::*;
pub use typestate::*;
