//! Zone domain module
//!
//! Zone types carry fee modifiers and a speed limit; map zones are the
//! polygons of a city that belong to a zone type.

mod model;
mod service;

pub use model::*;
pub use service::ZoneService;
