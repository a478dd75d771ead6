//! Admin accounts (read only; admins are provisioned in the database)

mod model;
mod service;

pub use model::*;
pub use service::AdminService;
