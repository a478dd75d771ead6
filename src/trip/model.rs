//! Trip models and request DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Relationship, Resource, SortDirection};

pub const RESOURCE_TYPE: &str = "trips";

/// Columns selected for a [`Trip`], geometries rendered as WKT
pub const TRIP_COLUMNS: &str = "id, bike_id, user_id, start_time, end_time, \
    ST_AsText(start_position) AS start_position, \
    ST_AsText(end_position) AS end_position, \
    ST_AsText(path_taken) AS path_taken, \
    start_fee, time_fee, end_fee, total_fee, created_at, updated_at";

/// Trip row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trip {
    pub id: i64,
    pub bike_id: i64,
    pub user_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_position: String,
    pub end_position: Option<String>,
    pub path_taken: Option<String>,
    pub start_fee: Option<Decimal>,
    pub time_fee: Option<Decimal>,
    pub end_fee: Option<Decimal>,
    pub total_fee: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct TripAttributes {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_position: String,
    pub end_position: Option<String>,
    pub path_taken: Option<String>,
    pub start_fee: Option<Decimal>,
    pub time_fee: Option<Decimal>,
    pub end_fee: Option<Decimal>,
    pub total_fee: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// JSON:API resource with user and bike relationships
    pub fn into_resource(self, base_url: &str) -> Resource<TripAttributes> {
        let link = format!("{}/v1/trips/{}", base_url, self.id);
        Resource::new(
            RESOURCE_TYPE,
            self.id,
            TripAttributes {
                start_time: self.start_time,
                end_time: self.end_time,
                start_position: self.start_position,
                end_position: self.end_position,
                path_taken: self.path_taken,
                start_fee: self.start_fee,
                time_fee: self.time_fee,
                end_fee: self.end_fee,
                total_fee: self.total_fee,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        )
        .with_relationship(
            "user",
            Relationship::to_one("users", self.user_id)
                .with_link(format!("{}/v1/users/{}", base_url, self.user_id)),
        )
        .with_relationship(
            "bike",
            Relationship::to_one("bikes", self.bike_id)
                .with_link(format!("{}/v1/bikes/{}", base_url, self.bike_id)),
        )
        .with_link(link)
    }
}

/// `POST /v1/trips`
#[derive(Debug, Deserialize, Validate)]
pub struct StartTripRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub bike_id: i64,
    /// Defaults to the token subject
    pub user_id: Option<i64>,
}

/// `PATCH /v1/trips/{id}`
#[derive(Debug, Deserialize, Validate)]
pub struct EndTripRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub bike_id: i64,
    pub user_id: Option<i64>,
    #[serde(default)]
    pub maintenance: bool,
    #[serde(default)]
    pub ignore_zone: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripSortField {
    #[default]
    StartTime,
    EndTime,
    TotalFee,
    CreatedAt,
}

impl TripSortField {
    pub fn column(&self) -> &'static str {
        match self {
            TripSortField::StartTime => "start_time",
            TripSortField::EndTime => "end_time",
            TripSortField::TotalFee => "total_fee",
            TripSortField::CreatedAt => "created_at",
        }
    }
}

/// Query parameters for listing trips
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListTripsQuery {
    pub user_id: Option<i64>,
    pub bike_id: Option<i64>,
    /// `true` for open trips only, `false` for ended trips only
    pub is_ongoing: Option<bool>,
    pub start_time_gt: Option<DateTime<Utc>>,
    pub start_time_lt: Option<DateTime<Utc>>,
    pub end_time_gt: Option<DateTime<Utc>>,
    pub end_time_lt: Option<DateTime<Utc>>,
    pub order_by: Option<TripSortField>,
    pub order_direction: Option<SortDirection>,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}
