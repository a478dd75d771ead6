//! Bike models and request DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::geometry::wkt_point;
use crate::models::{Relationship, Resource, SortDirection};

pub const RESOURCE_TYPE: &str = "bikes";

pub const BIKE_COLUMNS: &str = "id, battery_lvl, ST_AsText(last_position) AS last_position, \
    city_id, is_available, meta_data, created_at, updated_at, deleted_at";

/// Bike row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bike {
    pub id: i64,
    pub battery_lvl: i32,
    pub last_position: Option<String>,
    pub city_id: i32,
    pub is_available: bool,
    pub meta_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A bike found inside a map zone
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BikeInZone {
    #[sqlx(flatten)]
    pub bike: Bike,
    pub map_zone_id: i32,
}

#[derive(Debug, Serialize)]
pub struct BikeAttributes {
    pub battery_lvl: i32,
    pub last_position: Option<String>,
    pub is_available: bool,
    pub meta_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bike {
    pub fn into_resource(self, base_url: &str) -> Resource<BikeAttributes> {
        let link = format!("{}/v1/bikes/{}", base_url, self.id);
        Resource::new(
            RESOURCE_TYPE,
            self.id,
            BikeAttributes {
                battery_lvl: self.battery_lvl,
                last_position: self.last_position,
                is_available: self.is_available,
                meta_data: self.meta_data,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        )
        .with_relationship(
            "city",
            Relationship::to_one("cities", self.city_id)
                .with_link(format!("{}/v1/cities/{}", base_url, self.city_id)),
        )
        .with_link(link)
    }
}

impl BikeInZone {
    pub fn into_resource(self, base_url: &str) -> Resource<BikeAttributes> {
        let zone_link = format!("{}/v1/zones/{}", base_url, self.map_zone_id);
        self.bike.into_resource(base_url).with_relationship(
            "map_zone",
            Relationship::to_one("map_zones", self.map_zone_id).with_link(zone_link),
        )
    }
}

/// Request DTO for registering a bike
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBikeRequest {
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub battery_lvl: i32,
    #[validate(range(min = 1))]
    pub city_id: i32,
    #[validate(custom = "wkt_point")]
    pub last_position: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    pub meta_data: Option<Value>,
}

fn default_true() -> bool {
    true
}

/// Request DTO for a partial bike update
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBikeRequest {
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub battery_lvl: Option<i32>,
    #[validate(range(min = 1))]
    pub city_id: Option<i32>,
    #[validate(custom = "wkt_point")]
    pub last_position: Option<String>,
    pub is_available: Option<bool>,
    pub meta_data: Option<Value>,
}

impl UpdateBikeRequest {
    pub fn is_empty(&self) -> bool {
        self.battery_lvl.is_none()
            && self.city_id.is_none()
            && self.last_position.is_none()
            && self.is_available.is_none()
            && self.meta_data.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BikeSortField {
    Id,
    #[default]
    CreatedAt,
    UpdatedAt,
    CityId,
    IsAvailable,
    BatteryLvl,
}

impl BikeSortField {
    pub fn column(&self) -> &'static str {
        match self {
            BikeSortField::Id => "id",
            BikeSortField::CreatedAt => "created_at",
            BikeSortField::UpdatedAt => "updated_at",
            BikeSortField::CityId => "city_id",
            BikeSortField::IsAvailable => "is_available",
            BikeSortField::BatteryLvl => "battery_lvl",
        }
    }
}

/// Query parameters for listing bikes.
///
/// The public "available bikes" listing ignores `is_available` and the
/// timestamp ranges.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListBikesQuery {
    #[validate(range(min = 1))]
    pub city_id: Option<i32>,
    pub is_available: Option<bool>,
    pub min_battery: Option<i32>,
    pub max_battery: Option<i32>,
    pub created_at_gt: Option<DateTime<Utc>>,
    pub created_at_lt: Option<DateTime<Utc>>,
    pub updated_at_gt: Option<DateTime<Utc>>,
    pub updated_at_lt: Option<DateTime<Utc>>,
    pub order_by: Option<BikeSortField>,
    pub order_direction: Option<SortDirection>,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

/// Query parameters for bikes inside zones of one type
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BikesInZoneQuery {
    #[validate(range(min = 1))]
    pub zone_type_id: i32,
    #[validate(range(min = 1))]
    pub city_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_bike_validation() {
        let request: CreateBikeRequest = serde_json::from_value(serde_json::json!({
            "battery_lvl": 101,
            "city_id": 1,
            "last_position": "POINT(200 55)"
        }))
        .unwrap();

        assert!(request.is_available);
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("battery_lvl"));
        assert!(fields.contains_key("last_position"));
    }

    #[test]
    fn test_bike_resource_has_city_relationship() {
        let bike = Bike {
            id: 4,
            battery_lvl: 80,
            last_position: Some("POINT(13.1 55.6)".to_string()),
            city_id: 2,
            is_available: true,
            meta_data: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let value = serde_json::to_value(
            BikeInZone {
                bike,
                map_zone_id: 9,
            }
            .into_resource("http://api"),
        )
        .unwrap();

        assert_eq!(value["relationships"]["city"]["data"]["id"], "2");
        assert_eq!(value["relationships"]["map_zone"]["data"]["id"], "9");
        assert_eq!(value["links"]["self"], "http://api/v1/bikes/4");
    }
}
