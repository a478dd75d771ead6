//! Zone service layer - zone types, map zones and point lookup

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::model::{
    CreateMapZoneRequest, CreateZoneTypeRequest, ListMapZonesQuery, MapZone, UpdateMapZoneRequest,
    UpdateZoneTypeRequest, ZoneType, MAP_ZONE_COLUMNS, ZONE_TYPE_COLUMNS,
};
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::models::{ilike_pattern, push_order_and_page, push_time_range, SortDirection};

const DEFAULT_PAGE_SIZE: i64 = 100;

const ZONE_TYPE_NAME_KEY: &str = "zone_types_name_key";

#[derive(Clone)]
pub struct ZoneService {
    db_pool: PgPool,
}

impl ZoneService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Zone types

    pub async fn list_zone_types(&self) -> ApiResult<Vec<ZoneType>> {
        let zone_types = sqlx::query_as::<_, ZoneType>(&format!(
            "SELECT {} FROM zone_types WHERE deleted_at IS NULL ORDER BY id",
            ZONE_TYPE_COLUMNS
        ))
        .fetch_all(&self.db_pool)
        .await?;
        Ok(zone_types)
    }

    pub async fn get_zone_type(&self, zone_type_id: i32) -> ApiResult<ZoneType> {
        sqlx::query_as::<_, ZoneType>(&format!(
            "SELECT {} FROM zone_types WHERE id = $1 AND deleted_at IS NULL",
            ZONE_TYPE_COLUMNS
        ))
        .bind(zone_type_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| zone_type_not_found(zone_type_id))
    }

    pub async fn create_zone_type(&self, request: CreateZoneTypeRequest) -> ApiResult<ZoneType> {
        let zone_type = sqlx::query_as::<_, ZoneType>(&format!(
            r#"
            INSERT INTO zone_types (type_name, speed_limit, start_fee, end_fee, meta_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ZONE_TYPE_COLUMNS
        ))
        .bind(&request.type_name)
        .bind(request.speed_limit)
        .bind(request.start_fee)
        .bind(request.end_fee)
        .bind(&request.meta_data)
        .fetch_one(&self.db_pool)
        .await
        .map_err(map_zone_type_conflict)?;

        tracing::info!(zone_type_id = zone_type.id, type_name = %zone_type.type_name, "Zone type created");

        Ok(zone_type)
    }

    pub async fn update_zone_type(
        &self,
        zone_type_id: i32,
        request: UpdateZoneTypeRequest,
    ) -> ApiResult<ZoneType> {
        if request.is_empty() {
            return self.get_zone_type(zone_type_id).await;
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE zone_types SET updated_at = NOW()");
        if let Some(type_name) = request.type_name {
            builder.push(", type_name = ").push_bind(type_name);
        }
        if let Some(speed_limit) = request.speed_limit {
            builder.push(", speed_limit = ").push_bind(speed_limit);
        }
        if let Some(start_fee) = request.start_fee {
            builder.push(", start_fee = ").push_bind(start_fee);
        }
        if let Some(end_fee) = request.end_fee {
            builder.push(", end_fee = ").push_bind(end_fee);
        }
        if let Some(meta_data) = request.meta_data {
            builder.push(", meta_data = ").push_bind(meta_data);
        }
        builder
            .push(" WHERE id = ")
            .push_bind(zone_type_id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(ZONE_TYPE_COLUMNS);

        builder
            .build_query_as::<ZoneType>()
            .fetch_optional(&self.db_pool)
            .await
            .map_err(map_zone_type_conflict)?
            .ok_or_else(|| zone_type_not_found(zone_type_id))
    }

    /// Soft delete a zone type
    pub async fn delete_zone_type(&self, zone_type_id: i32) -> ApiResult<()> {
        let deleted = sqlx::query(
            "UPDATE zone_types SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(zone_type_id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(zone_type_not_found(zone_type_id));
        }
        Ok(())
    }

    // Map zones

    pub async fn list_map_zones(&self, query: &ListMapZonesQuery) -> ApiResult<Vec<MapZone>> {
        let zones = build_map_zone_query(query)
            .build_query_as::<MapZone>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(zones)
    }

    pub async fn get_map_zone(&self, zone_id: i32) -> ApiResult<MapZone> {
        sqlx::query_as::<_, MapZone>(&format!(
            "SELECT {} FROM map_zones WHERE id = $1",
            MAP_ZONE_COLUMNS
        ))
        .bind(zone_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| map_zone_not_found(zone_id))
    }

    pub async fn create_map_zone(&self, request: CreateMapZoneRequest) -> ApiResult<MapZone> {
        let zone = sqlx::query_as::<_, MapZone>(&format!(
            r#"
            INSERT INTO map_zones (zone_name, zone_type_id, city_id, boundary)
            VALUES ($1, $2, $3, ST_GeomFromText($4, 4326))
            RETURNING {}
            "#,
            MAP_ZONE_COLUMNS
        ))
        .bind(&request.zone_name)
        .bind(request.zone_type_id)
        .bind(request.city_id)
        .bind(&request.boundary)
        .fetch_one(&self.db_pool)
        .await
        .map_err(map_reference_violation)?;

        tracing::info!(zone_id = zone.id, zone_name = %zone.zone_name, "Map zone created");

        Ok(zone)
    }

    pub async fn update_map_zone(
        &self,
        zone_id: i32,
        request: UpdateMapZoneRequest,
    ) -> ApiResult<MapZone> {
        if request.is_empty() {
            return self.get_map_zone(zone_id).await;
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE map_zones SET updated_at = NOW()");
        if let Some(zone_name) = request.zone_name {
            builder.push(", zone_name = ").push_bind(zone_name);
        }
        if let Some(zone_type_id) = request.zone_type_id {
            builder.push(", zone_type_id = ").push_bind(zone_type_id);
        }
        if let Some(city_id) = request.city_id {
            builder.push(", city_id = ").push_bind(city_id);
        }
        if let Some(boundary) = request.boundary {
            builder
                .push(", boundary = ST_GeomFromText(")
                .push_bind(boundary)
                .push(", 4326)");
        }
        builder
            .push(" WHERE id = ")
            .push_bind(zone_id)
            .push(" RETURNING ")
            .push(MAP_ZONE_COLUMNS);

        builder
            .build_query_as::<MapZone>()
            .fetch_optional(&self.db_pool)
            .await
            .map_err(map_reference_violation)?
            .ok_or_else(|| map_zone_not_found(zone_id))
    }

    /// Hard delete a map zone
    pub async fn delete_map_zone(&self, zone_id: i32) -> ApiResult<()> {
        let deleted = sqlx::query("DELETE FROM map_zones WHERE id = $1")
            .bind(zone_id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(map_zone_not_found(zone_id));
        }
        Ok(())
    }

    /// The map zone containing a WKT point.
    ///
    /// Overlapping zones resolve to the smallest one.
    pub async fn zone_for_point(&self, position: &str, city_id: Option<i32>) -> ApiResult<MapZone> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM map_zones WHERE ST_Contains(boundary, ST_GeomFromText(",
            MAP_ZONE_COLUMNS
        ));
        builder.push_bind(position.to_string()).push(", 4326))");
        if let Some(city_id) = city_id {
            builder.push(" AND city_id = ").push_bind(city_id);
        }
        builder.push(" ORDER BY ST_Area(boundary) ASC, id ASC LIMIT 1");

        builder
            .build_query_as::<MapZone>()
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No zone contains {}", position)))
    }
}

fn zone_type_not_found(zone_type_id: i32) -> ApiError {
    ApiError::NotFound(format!("Zone type with ID {} not found", zone_type_id))
}

fn map_zone_not_found(zone_id: i32) -> ApiError {
    ApiError::NotFound(format!("Map zone with ID {} not found", zone_id))
}

fn map_zone_type_conflict(err: sqlx::Error) -> ApiError {
    if is_unique_violation(&err, ZONE_TYPE_NAME_KEY) {
        ApiError::Conflict("A zone type with this name already exists".to_string())
    } else {
        err.into()
    }
}

fn map_reference_violation(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            ApiError::NotFound("Referenced city or zone type not found".to_string())
        }
        _ => err.into(),
    }
}

fn build_map_zone_query(query: &ListMapZonesQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM map_zones WHERE 1=1", MAP_ZONE_COLUMNS));

    if let Some(name) = &query.zone_name_search {
        builder.push(" AND zone_name ILIKE ");
        builder.push_bind(ilike_pattern(name));
    }
    if let Some(city_id) = query.city_id {
        builder.push(" AND city_id = ");
        builder.push_bind(city_id);
    }
    if let Some(zone_type_id) = query.zone_type_id {
        builder.push(" AND zone_type_id = ");
        builder.push_bind(zone_type_id);
    }
    push_time_range(&mut builder, "created_at", query.created_at_gt, query.created_at_lt);
    push_time_range(&mut builder, "updated_at", query.updated_at_gt, query.updated_at_lt);

    push_order_and_page(
        &mut builder,
        query.order_by.unwrap_or_default().column(),
        query.order_direction.unwrap_or(SortDirection::Asc),
        query.limit,
        query.offset,
        DEFAULT_PAGE_SIZE,
    );

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::MapZoneSortField;

    #[test]
    fn test_map_zone_query_defaults_ascending() {
        let query = ListMapZonesQuery {
            zone_name_search: Some("cent".to_string()),
            city_id: Some(1),
            order_by: Some(MapZoneSortField::ZoneName),
            ..Default::default()
        };
        let builder = build_map_zone_query(&query);
        let sql = builder.sql();

        assert!(sql.contains("WHERE 1=1 AND zone_name ILIKE $1 AND city_id = $2"));
        assert!(sql.ends_with("ORDER BY zone_name ASC, id ASC LIMIT $3 OFFSET $4"));
    }
}
