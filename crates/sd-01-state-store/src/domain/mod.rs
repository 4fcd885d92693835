pub mod delta;
pub mod entities;
pub mod errors;
pub mod view;

pub use delta::*;
pub use entities::*;
pub use errors::*;
pub use view::*;
