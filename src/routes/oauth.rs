//! OAuth route definitions

use axum::{routing::post, Router};

use crate::handlers::oauth::github_login;
use crate::state::AppState;

pub fn oauth_routes() -> Router<AppState> {
    Router::new().route("/v1/oauth/github", post(github_login))
}
