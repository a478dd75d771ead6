//! Routes for the authenticated user

use axum::{routing::get, Router};

use crate::handlers::me::*;
use crate::state::AppState;

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/me", get(get_me).patch(update_me).delete(delete_me))
        .route("/v1/me/trips", get(my_trips))
        .route("/v1/me/trips/:id", get(my_trip))
        .route("/v1/me/transactions", get(my_transactions))
}
