//! API handlers for the bike-share backend

pub mod admin;
pub mod bikes;
pub mod cities;
mod extract;
pub mod health;
pub mod me;
pub mod oauth;
pub mod transactions;
pub mod trips;
pub mod users;
pub mod zones;

pub use extract::{Path, ValidatedJson, ValidatedQuery};
