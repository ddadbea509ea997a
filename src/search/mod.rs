mod index;
mod places;

pub use index::*;
pub use places::*;
