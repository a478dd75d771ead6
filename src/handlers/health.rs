//! Service info and health check

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// GET /
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Welcome to the bike-share API",
        name: "bikeshare-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgis: Option<String>,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database, postgis) = match db::check_health(&state.db_pool).await {
        Ok(db_status) => (
            "healthy",
            StatusCode::OK,
            "connected".to_string(),
            Some(db_status.postgis_version),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                "unhealthy",
                StatusCode::SERVICE_UNAVAILABLE,
                format!("error: {}", e),
                None,
            )
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            postgis,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
