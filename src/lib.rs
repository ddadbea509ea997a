//! An in-memory public-transport journey-planning and place-lookup engine:
//! a frozen network snapshot queried by a RAPTOR-style planner, a ranked
//! autocomplete pipeline and an isochrone builder, behind a request facade.

pub mod model;
pub mod routing;
pub mod search;
pub mod shared;
pub mod worker;
