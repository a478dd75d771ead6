//! Bike service layer

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::model::{
    Bike, BikeInZone, BikesInZoneQuery, CreateBikeRequest, ListBikesQuery, UpdateBikeRequest,
    BIKE_COLUMNS,
};
use crate::error::{ApiError, ApiResult};
use crate::models::{push_order_and_page, push_time_range};

const DEFAULT_PAGE_SIZE: i64 = 300;

/// Bike service for fleet management
#[derive(Clone)]
pub struct BikeService {
    db_pool: PgPool,
}

impl BikeService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// List bikes (admin view)
    pub async fn list_bikes(&self, query: &ListBikesQuery) -> ApiResult<Vec<Bike>> {
        let bikes = build_list_query(query, false)
            .build_query_as::<Bike>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(bikes)
    }

    /// List bikes a rider can pick up right now
    pub async fn list_available_bikes(&self, query: &ListBikesQuery) -> ApiResult<Vec<Bike>> {
        let bikes = build_list_query(query, true)
            .build_query_as::<Bike>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(bikes)
    }

    /// Bikes whose last position lies inside a zone of the given type
    pub async fn bikes_in_zone(&self, query: &BikesInZoneQuery) -> ApiResult<Vec<BikeInZone>> {
        let bikes = sqlx::query_as::<_, BikeInZone>(&format!(
            r#"
            SELECT {}, z.id AS map_zone_id
            FROM bikes b
            JOIN map_zones z ON ST_Contains(z.boundary, b.last_position)
            WHERE z.zone_type_id = $1 AND b.city_id = $2 AND b.deleted_at IS NULL
            ORDER BY b.id
            "#,
            qualified_columns("b")
        ))
        .bind(query.zone_type_id)
        .bind(query.city_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(bikes)
    }

    pub async fn get_bike(&self, bike_id: i64) -> ApiResult<Bike> {
        sqlx::query_as::<_, Bike>(&format!(
            "SELECT {} FROM bikes WHERE id = $1 AND deleted_at IS NULL",
            BIKE_COLUMNS
        ))
        .bind(bike_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| bike_not_found(bike_id))
    }

    pub async fn create_bike(&self, request: CreateBikeRequest) -> ApiResult<Bike> {
        let bike = sqlx::query_as::<_, Bike>(&format!(
            r#"
            INSERT INTO bikes (battery_lvl, city_id, last_position, is_available, meta_data)
            VALUES ($1, $2, ST_GeomFromText($3, 4326), $4, $5)
            RETURNING {}
            "#,
            BIKE_COLUMNS
        ))
        .bind(request.battery_lvl)
        .bind(request.city_id)
        .bind(&request.last_position)
        .bind(request.is_available)
        .bind(&request.meta_data)
        .fetch_one(&self.db_pool)
        .await
        .map_err(map_city_violation)?;

        tracing::info!(bike_id = bike.id, city_id = bike.city_id, "Bike created");

        Ok(bike)
    }

    pub async fn update_bike(&self, bike_id: i64, request: UpdateBikeRequest) -> ApiResult<Bike> {
        if request.is_empty() {
            return self.get_bike(bike_id).await;
        }

        build_update_query(bike_id, request)
            .build_query_as::<Bike>()
            .fetch_optional(&self.db_pool)
            .await
            .map_err(map_city_violation)?
            .ok_or_else(|| bike_not_found(bike_id))
    }

    /// Soft delete: retire the bike from service
    pub async fn delete_bike(&self, bike_id: i64) -> ApiResult<()> {
        let deleted = sqlx::query(
            r#"
            UPDATE bikes
            SET deleted_at = NOW(), updated_at = NOW(),
                is_available = FALSE, last_position = NULL, battery_lvl = 0
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(bike_id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(bike_not_found(bike_id));
        }

        tracing::info!(bike_id, "Bike soft deleted");

        Ok(())
    }
}

fn bike_not_found(bike_id: i64) -> ApiError {
    ApiError::NotFound(format!("Bike with ID {} not found", bike_id))
}

fn map_city_violation(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            ApiError::NotFound("City not found".to_string())
        }
        _ => err.into(),
    }
}

/// Bike columns prefixed with a table alias
fn qualified_columns(alias: &str) -> String {
    format!(
        "{a}.id, {a}.battery_lvl, ST_AsText({a}.last_position) AS last_position, {a}.city_id, \
         {a}.is_available, {a}.meta_data, {a}.created_at, {a}.updated_at, {a}.deleted_at",
        a = alias
    )
}

fn build_list_query(query: &ListBikesQuery, available_only: bool) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM bikes WHERE deleted_at IS NULL",
        BIKE_COLUMNS
    ));

    if available_only {
        builder.push(" AND is_available = TRUE");
    } else if let Some(is_available) = query.is_available {
        builder.push(" AND is_available = ");
        builder.push_bind(is_available);
    }
    if let Some(city_id) = query.city_id {
        builder.push(" AND city_id = ");
        builder.push_bind(city_id);
    }
    if let Some(min) = query.min_battery {
        builder.push(" AND battery_lvl >= ");
        builder.push_bind(min);
    }
    if let Some(max) = query.max_battery {
        builder.push(" AND battery_lvl <= ");
        builder.push_bind(max);
    }
    if !available_only {
        push_time_range(&mut builder, "created_at", query.created_at_gt, query.created_at_lt);
        push_time_range(&mut builder, "updated_at", query.updated_at_gt, query.updated_at_lt);
    }

    push_order_and_page(
        &mut builder,
        query.order_by.unwrap_or_default().column(),
        query.order_direction.unwrap_or_default(),
        query.limit,
        query.offset,
        DEFAULT_PAGE_SIZE,
    );

    builder
}

fn build_update_query(bike_id: i64, request: UpdateBikeRequest) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE bikes SET updated_at = NOW()");

    if let Some(battery_lvl) = request.battery_lvl {
        builder.push(", battery_lvl = ").push_bind(battery_lvl);
    }
    if let Some(city_id) = request.city_id {
        builder.push(", city_id = ").push_bind(city_id);
    }
    if let Some(position) = request.last_position {
        builder
            .push(", last_position = ST_GeomFromText(")
            .push_bind(position)
            .push(", 4326)");
    }
    if let Some(is_available) = request.is_available {
        builder.push(", is_available = ").push_bind(is_available);
    }
    if let Some(meta_data) = request.meta_data {
        builder.push(", meta_data = ").push_bind(meta_data);
    }

    builder
        .push(" WHERE id = ")
        .push_bind(bike_id)
        .push(" AND deleted_at IS NULL RETURNING ")
        .push(BIKE_COLUMNS);

    builder
}
