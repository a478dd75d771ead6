//! Zone type and map zone models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::models::geometry::{wkt_point, wkt_polygon};
use crate::models::{Relationship, Resource, SortDirection};

pub const ZONE_TYPE_RESOURCE: &str = "zone_types";
pub const MAP_ZONE_RESOURCE: &str = "map_zones";

pub const ZONE_TYPE_COLUMNS: &str = "id, type_name, speed_limit, start_fee, end_fee, \
    meta_data, created_at, updated_at, deleted_at";

pub const MAP_ZONE_COLUMNS: &str = "id, zone_name, zone_type_id, city_id, \
    ST_AsText(boundary) AS boundary, created_at, updated_at";

/// Zone category with its fee modifiers
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ZoneType {
    pub id: i32,
    pub type_name: String,
    pub speed_limit: Option<i32>,
    pub start_fee: Decimal,
    pub end_fee: Decimal,
    pub meta_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ZoneTypeAttributes {
    pub type_name: String,
    pub speed_limit: Option<i32>,
    pub start_fee: Decimal,
    pub end_fee: Decimal,
    pub meta_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ZoneType {
    pub fn into_resource(self, base_url: &str) -> Resource<ZoneTypeAttributes> {
        let link = format!("{}/v1/zone-types/{}", base_url, self.id);
        Resource::new(
            ZONE_TYPE_RESOURCE,
            self.id,
            ZoneTypeAttributes {
                type_name: self.type_name,
                speed_limit: self.speed_limit,
                start_fee: self.start_fee,
                end_fee: self.end_fee,
                meta_data: self.meta_data,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        )
        .with_link(link)
    }
}

/// Polygon area of a city belonging to one zone type
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MapZone {
    pub id: i32,
    pub zone_name: String,
    pub zone_type_id: i32,
    pub city_id: i32,
    pub boundary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MapZoneAttributes {
    pub zone_name: String,
    pub boundary: String,
    pub city_id: i32,
    pub zone_type_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MapZone {
    pub fn into_resource(self, base_url: &str) -> Resource<MapZoneAttributes> {
        let link = format!("{}/v1/zones/{}", base_url, self.id);
        Resource::new(
            MAP_ZONE_RESOURCE,
            self.id,
            MapZoneAttributes {
                zone_name: self.zone_name,
                boundary: self.boundary,
                city_id: self.city_id,
                zone_type_id: self.zone_type_id,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        )
        .with_relationship(
            "city",
            Relationship::to_one("cities", self.city_id)
                .with_link(format!("{}/v1/cities/{}", base_url, self.city_id)),
        )
        .with_relationship(
            "zone_type",
            Relationship::to_one(ZONE_TYPE_RESOURCE, self.zone_type_id)
                .with_link(format!("{}/v1/zone-types/{}", base_url, self.zone_type_id)),
        )
        .with_link(link)
    }
}

/// Zone fees are currency amounts and never negative
pub fn validate_fee(fee: &Decimal) -> Result<(), ValidationError> {
    if fee.is_sign_negative() || fee.normalize().scale() > 2 {
        let mut err = ValidationError::new("fee");
        err.message = Some("must be a non-negative amount with at most two decimals".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateZoneTypeRequest {
    #[validate(length(min = 1, max = 100))]
    pub type_name: String,
    #[validate(range(min = 0, max = 100))]
    pub speed_limit: Option<i32>,
    #[validate(custom = "validate_fee")]
    pub start_fee: Decimal,
    #[validate(custom = "validate_fee")]
    pub end_fee: Decimal,
    pub meta_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateZoneTypeRequest {
    #[validate(length(min = 1, max = 100))]
    pub type_name: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub speed_limit: Option<i32>,
    #[validate(custom = "validate_fee")]
    pub start_fee: Option<Decimal>,
    #[validate(custom = "validate_fee")]
    pub end_fee: Option<Decimal>,
    pub meta_data: Option<Value>,
}

impl UpdateZoneTypeRequest {
    pub fn is_empty(&self) -> bool {
        self.type_name.is_none()
            && self.speed_limit.is_none()
            && self.start_fee.is_none()
            && self.end_fee.is_none()
            && self.meta_data.is_none()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMapZoneRequest {
    #[validate(length(min = 1, max = 255))]
    pub zone_name: String,
    #[validate(range(min = 1))]
    pub zone_type_id: i32,
    #[validate(range(min = 1))]
    pub city_id: i32,
    #[validate(custom = "wkt_polygon")]
    pub boundary: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMapZoneRequest {
    #[validate(length(min = 1, max = 255))]
    pub zone_name: Option<String>,
    #[validate(range(min = 1))]
    pub zone_type_id: Option<i32>,
    #[validate(range(min = 1))]
    pub city_id: Option<i32>,
    #[validate(custom = "wkt_polygon")]
    pub boundary: Option<String>,
}

impl UpdateMapZoneRequest {
    pub fn is_empty(&self) -> bool {
        self.zone_name.is_none()
            && self.zone_type_id.is_none()
            && self.city_id.is_none()
            && self.boundary.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MapZoneSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    ZoneName,
    CityId,
    ZoneTypeId,
}

impl MapZoneSortField {
    pub fn column(&self) -> &'static str {
        match self {
            MapZoneSortField::CreatedAt => "created_at",
            MapZoneSortField::UpdatedAt => "updated_at",
            MapZoneSortField::ZoneName => "zone_name",
            MapZoneSortField::CityId => "city_id",
            MapZoneSortField::ZoneTypeId => "zone_type_id",
        }
    }
}

/// Query parameters for listing map zones
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListMapZonesQuery {
    #[validate(length(min = 3))]
    pub zone_name_search: Option<String>,
    pub city_id: Option<i32>,
    pub zone_type_id: Option<i32>,
    pub created_at_gt: Option<DateTime<Utc>>,
    pub created_at_lt: Option<DateTime<Utc>>,
    pub updated_at_gt: Option<DateTime<Utc>>,
    pub updated_at_lt: Option<DateTime<Utc>>,
    pub order_by: Option<MapZoneSortField>,
    /// Ascending unless given
    pub order_direction: Option<SortDirection>,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

/// `GET /v1/zones/lookup?position=POINT(..)`
#[derive(Debug, Deserialize, Validate)]
pub struct ZoneLookupQuery {
    #[validate(custom = "wkt_point")]
    pub position: String,
    pub city_id: Option<i32>,
}
