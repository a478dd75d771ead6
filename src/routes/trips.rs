//! Trip route definitions

use axum::{routing::get, Router};

use crate::handlers::trips::*;
use crate::state::AppState;

pub fn trip_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips", get(list_trips).post(start_trip))
        .route("/v1/trips/:id", get(get_trip).patch(end_trip))
}
