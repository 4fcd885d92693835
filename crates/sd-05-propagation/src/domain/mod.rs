//! # Domain Layer for Propagation
//!
//! Pure, synchronous logic: configuration, the outbound priority queue, the
//! seen-transaction cache and peer selection. No I/O.

mod errors;
mod queue;
mod services;
mod value_objects;

pub use errors::*;
pub use queue::*;
pub use services::*;
pub use value_objects::*;
