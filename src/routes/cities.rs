//! City route definitions

use axum::{routing::get, Router};

use crate::handlers::cities::*;
use crate::state::AppState;

pub fn city_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cities", get(list_cities))
        .route("/v1/cities/:id", get(get_city))
}
