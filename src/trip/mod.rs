//! Trip domain module
//!
//! Trip lifecycle (start, end, fee calculation) and trip queries.

mod error;
mod fees;
mod model;
mod service;

pub use error::TripError;
pub use fees::{compute_fees, elapsed_minutes, FeeBreakdown, FeeSchedule};
pub use model::*;
pub use service::{EndTripParams, TripService};
