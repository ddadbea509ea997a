pub mod datetime;
pub mod geo;

pub use datetime::*;
pub use geo::*;
