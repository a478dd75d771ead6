//! Transaction route definitions

use axum::{routing::get, Router};

use crate::handlers::transactions::*;
use crate::state::AppState;

pub fn transaction_routes() -> Router<AppState> {
    Router::new().route("/v1/transactions", get(list_transactions).post(deposit))
}
