//! Bike-share backend library
//!
//! Trips, users, admins, bikes, zones and payments behind a JSON:API HTTP surface.

pub mod admin;
pub mod auth;
pub mod bike;
pub mod bike_client;
pub mod city;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod transaction;
pub mod trip;
pub mod user;
pub mod zone;
