//! Admin route definitions

use axum::{routing::get, Router};

use crate::handlers::admin::*;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin", get(get_my_admin))
        .route("/v1/admin/all", get(list_admins))
}
