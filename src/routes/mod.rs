//! Route definitions for the bike-share API

mod admin;
mod bikes;
mod cities;
mod me;
mod oauth;
mod transactions;
mod trips;
mod users;
mod zones;

use axum::{routing::get, Router};

use crate::handlers::health::{health_check, root};
use crate::middleware;
use crate::state::AppState;

pub use admin::admin_routes;
pub use bikes::bike_routes;
pub use cities::city_routes;
pub use me::me_routes;
pub use oauth::oauth_routes;
pub use transactions::transaction_routes;
pub use trips::trip_routes;
pub use users::user_routes;
pub use zones::zone_routes;

/// The full API with request tracing applied
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(oauth_routes())
        .merge(me_routes())
        .merge(user_routes())
        .merge(admin_routes())
        .merge(bike_routes())
        .merge(trip_routes())
        .merge(transaction_routes())
        .merge(zone_routes())
        .merge(city_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
