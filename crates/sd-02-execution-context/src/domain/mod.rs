pub mod change_context;
pub mod container;

pub use change_context::*;
pub use container::*;
