pub mod definition;
pub mod errors;
pub mod handler;
pub mod registry;

pub use definition::*;
pub use errors::*;
pub use handler::*;
pub use registry::*;
