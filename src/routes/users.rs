//! User route definitions

use axum::{routing::get, Router};

use crate::handlers::users::*;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", get(list_users).post(create_user))
        .route(
            "/v1/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}
