//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::admin::AdminService;
use crate::auth::{AuthService, GithubClient};
use crate::bike::BikeService;
use crate::bike_client::BikeHardware;
use crate::city::CityService;
use crate::config::Config;
use crate::transaction::TransactionService;
use crate::trip::TripService;
use crate::user::UserService;
use crate::zone::ZoneService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Base URL for resource links, without a trailing slash
    pub base_url: Arc<str>,
    pub db_pool: PgPool,
    pub auth_service: Arc<AuthService>,
    pub trip_service: Arc<TripService>,
    pub user_service: Arc<UserService>,
    pub admin_service: Arc<AdminService>,
    pub bike_service: Arc<BikeService>,
    pub transaction_service: Arc<TransactionService>,
    pub zone_service: Arc<ZoneService>,
    pub city_service: Arc<CityService>,
}

impl AppState {
    pub fn new(config: &Config, db_pool: PgPool, bike_hardware: Arc<dyn BikeHardware>) -> Self {
        let auth_service = AuthService::new(
            db_pool.clone(),
            GithubClient::new(config.github.clone()),
            config.jwt_secret.clone(),
            config.jwt_ttl_seconds,
        );
        let trip_service = TripService::new(
            db_pool.clone(),
            bike_hardware,
            config.fee_schedule.clone(),
        );

        Self {
            base_url: Arc::from(config.public_url.as_str()),
            auth_service: Arc::new(auth_service),
            trip_service: Arc::new(trip_service),
            user_service: Arc::new(UserService::new(db_pool.clone())),
            admin_service: Arc::new(AdminService::new(db_pool.clone())),
            bike_service: Arc::new(BikeService::new(db_pool.clone())),
            transaction_service: Arc::new(TransactionService::new(db_pool.clone())),
            zone_service: Arc::new(ZoneService::new(db_pool.clone())),
            city_service: Arc::new(CityService::new(db_pool.clone())),
            db_pool,
        }
    }

    /// Absolute URL for an API path such as `/v1/trips/1`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<TripService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.trip_service.clone()
    }
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.user_service.clone()
    }
}

impl FromRef<AppState> for Arc<AdminService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.admin_service.clone()
    }
}

impl FromRef<AppState> for Arc<BikeService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.bike_service.clone()
    }
}

impl FromRef<AppState> for Arc<TransactionService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.transaction_service.clone()
    }
}

impl FromRef<AppState> for Arc<ZoneService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.zone_service.clone()
    }
}

impl FromRef<AppState> for Arc<CityService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.city_service.clone()
    }
}
