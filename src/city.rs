//! Cities (read only)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{ApiError, ApiResult};
use crate::models::Resource;

pub const RESOURCE_TYPE: &str = "cities";

const CITY_COLUMNS: &str = "id, city_name, country_code, \
    ST_AsText(c_location) AS c_location, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct City {
    pub id: i32,
    pub city_name: String,
    pub country_code: String,
    pub c_location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CityAttributes {
    pub city_name: String,
    pub country_code: String,
    pub c_location: String,
}

impl City {
    pub fn into_resource(self, base_url: &str) -> Resource<CityAttributes> {
        let link = format!("{}/v1/cities/{}", base_url, self.id);
        Resource::new(
            RESOURCE_TYPE,
            self.id,
            CityAttributes {
                city_name: self.city_name,
                // CHAR(3) pads with spaces
                country_code: self.country_code.trim_end().to_string(),
                c_location: self.c_location,
            },
        )
        .with_link(link)
    }
}

#[derive(Clone)]
pub struct CityService {
    db_pool: PgPool,
}

impl CityService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn list_cities(&self) -> ApiResult<Vec<City>> {
        let cities = sqlx::query_as::<_, City>(&format!(
            "SELECT {} FROM cities ORDER BY id",
            CITY_COLUMNS
        ))
        .fetch_all(&self.db_pool)
        .await?;
        Ok(cities)
    }

    pub async fn get_city(&self, city_id: i32) -> ApiResult<City> {
        sqlx::query_as::<_, City>(&format!("SELECT {} FROM cities WHERE id = $1", CITY_COLUMNS))
            .bind(city_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("City with ID {} not found", city_id)))
    }
}
