//! Zone route definitions

use axum::{routing::get, Router};

use crate::handlers::zones::*;
use crate::state::AppState;

pub fn zone_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/zones", get(list_map_zones).post(create_map_zone))
        .route("/v1/zones/lookup", get(lookup_zone))
        .route(
            "/v1/zones/:id",
            get(get_map_zone)
                .patch(update_map_zone)
                .delete(delete_map_zone),
        )
        .route("/v1/zone-types", get(list_zone_types).post(create_zone_type))
        .route(
            "/v1/zone-types/:id",
            get(get_zone_type)
                .patch(update_zone_type)
                .delete(delete_zone_type),
        )
}
