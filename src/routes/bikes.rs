//! Bike route definitions

use axum::{routing::get, Router};

use crate::handlers::bikes::*;
use crate::state::AppState;

pub fn bike_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bikes", get(list_bikes).post(create_bike))
        .route("/v1/bikes/available", get(list_available_bikes))
        .route("/v1/bikes/bikes_in_zone", get(bikes_in_zone))
        .route(
            "/v1/bikes/:id",
            get(get_bike).patch(update_bike).delete(delete_bike),
        )
}
