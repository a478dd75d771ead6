//! Trip service layer - starting, ending and querying trips

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::error::TripError;
use super::fees::{compute_fees, FeeSchedule};
use super::model::{ListTripsQuery, Trip, TRIP_COLUMNS};
use crate::bike_client::{BikeEndData, BikeHardware};
use crate::error::is_unique_violation;
use crate::models::{push_order_and_page, push_time_range};

/// Partial unique index allowing one open trip per user
const ACTIVE_TRIP_INDEX: &str = "idx_one_active_trip_per_user";

const DEFAULT_PAGE_SIZE: i64 = 100;

/// Identifies the trip to close and how the bike should be left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndTripParams {
    pub trip_id: i64,
    pub user_id: i64,
    pub bike_id: i64,
    pub maintenance: bool,
    pub ignore_zone: bool,
}

/// Trip service for managing the trip lifecycle
#[derive(Clone)]
pub struct TripService {
    db_pool: PgPool,
    bike_hardware: Arc<dyn BikeHardware>,
    fee_schedule: FeeSchedule,
}

impl TripService {
    pub fn new(
        db_pool: PgPool,
        bike_hardware: Arc<dyn BikeHardware>,
        fee_schedule: FeeSchedule,
    ) -> Self {
        Self {
            db_pool,
            bike_hardware,
            fee_schedule,
        }
    }

    /// Start a trip.
    ///
    /// User and bike are checked before the bike is contacted. The trip row
    /// and the bike's availability change are written in one transaction; a
    /// second open trip for the same user is caught by the unique index.
    pub async fn start_trip(&self, user_id: i64, bike_id: i64) -> Result<Trip, TripError> {
        let (use_prepay, balance) = sqlx::query_as::<_, (bool, Decimal)>(
            "SELECT use_prepay, balance FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(TripError::UserNotFound(user_id))?;

        if use_prepay && balance <= Decimal::ZERO {
            return Err(TripError::UserNotEligible(user_id));
        }

        let is_available = sqlx::query_scalar::<_, bool>(
            "SELECT is_available FROM bikes WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(bike_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(TripError::BikeNotFound(bike_id))?;

        if !is_available {
            return Err(TripError::BikeUnavailable(bike_id));
        }

        // The bike needs the trip id before the row exists
        let trip_id = sqlx::query_scalar::<_, i64>(
            "SELECT nextval(pg_get_serial_sequence('trips', 'id'))",
        )
        .fetch_one(&self.db_pool)
        .await?;

        let started = self
            .bike_hardware
            .authorize_start(bike_id, user_id, trip_id)
            .await
            .map_err(|e| {
                tracing::warn!(trip_id, bike_id, user_id, error = %e, "Bike refused to start trip");
                TripError::from(e)
            })?;

        let mut tx = self.db_pool.begin().await?;

        // Serializes with account deletion, which locks the row FOR UPDATE
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM users WHERE id = $1 AND deleted_at IS NULL FOR SHARE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TripError::UserNotFound(user_id))?;

        let trip = sqlx::query_as::<_, Trip>(&format!(
            r#"
            INSERT INTO trips (id, bike_id, user_id, start_time, start_position)
            VALUES ($1, $2, $3, $4, ST_GeomFromText($5, 4326))
            RETURNING {}
            "#,
            TRIP_COLUMNS
        ))
        .bind(trip_id)
        .bind(bike_id)
        .bind(user_id)
        .bind(started.log.start_time)
        .bind(&started.log.start_position)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, ACTIVE_TRIP_INDEX) {
                TripError::ActiveTripExists(user_id)
            } else {
                TripError::Database(e)
            }
        })?;

        let reserved = sqlx::query(
            r#"
            UPDATE bikes
            SET is_available = FALSE, battery_lvl = $2,
                last_position = ST_GeomFromText($3, 4326), updated_at = NOW()
            WHERE id = $1 AND is_available AND deleted_at IS NULL
            "#,
        )
        .bind(bike_id)
        .bind(started.report.battery_percent())
        .bind(&started.report.last_position)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Another trip took the bike after our check; dropping tx rolls back
        if reserved == 0 {
            return Err(TripError::BikeUnavailable(bike_id));
        }

        tx.commit().await?;

        tracing::info!(trip_id = trip.id, user_id, bike_id, "Trip started");

        Ok(trip)
    }

    /// End a trip: validate ownership, lock the bike, then record the end.
    pub async fn end_trip(&self, params: EndTripParams) -> Result<Trip, TripError> {
        let trip = self.get_trip(params.trip_id).await?;
        check_trip_access(&trip, params.user_id, params.bike_id)?;

        let ended = self
            .bike_hardware
            .authorize_end(
                params.bike_id,
                params.user_id,
                params.trip_id,
                params.maintenance,
                params.ignore_zone,
            )
            .await
            .map_err(|e| {
                tracing::warn!(trip_id = params.trip_id, error = %e, "Bike refused to end trip");
                TripError::from(e)
            })?;

        self.record_trip_end(&params, &ended).await
    }

    /// Persist the end of a trip.
    ///
    /// Fees, trip row, balance debit, ledger entry and bike state commit
    /// together or not at all.
    pub async fn record_trip_end(
        &self,
        params: &EndTripParams,
        ended: &BikeEndData,
    ) -> Result<Trip, TripError> {
        let mut tx = self.db_pool.begin().await?;

        let trip = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {} FROM trips WHERE id = $1 FOR UPDATE",
            TRIP_COLUMNS
        ))
        .bind(params.trip_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TripError::TripNotFound(params.trip_id))?;

        check_trip_access(&trip, params.user_id, params.bike_id)?;

        // 1. Fees
        let fees = compute_fees(&self.fee_schedule, trip.start_time, ended.log.end_time);

        // 2. Close the trip
        let trip = sqlx::query_as::<_, Trip>(&format!(
            r#"
            UPDATE trips
            SET end_time = $2,
                end_position = ST_GeomFromText($3, 4326),
                path_taken = ST_GeomFromText($4, 4326),
                start_fee = $5, time_fee = $6, end_fee = $7, total_fee = $8,
                updated_at = NOW()
            WHERE id = $1 AND end_time IS NULL
            RETURNING {}
            "#,
            TRIP_COLUMNS
        ))
        .bind(params.trip_id)
        .bind(ended.log.end_time)
        .bind(&ended.log.end_position)
        .bind(&ended.log.path_taken)
        .bind(fees.start_fee)
        .bind(fees.time_fee)
        .bind(fees.end_fee)
        .bind(fees.total_fee)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TripError::TripAlreadyEnded(params.trip_id))?;

        // 3. Debit the user
        let debited = sqlx::query(
            "UPDATE users SET balance = balance - $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(params.user_id)
        .bind(fees.total_fee)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if debited == 0 {
            return Err(TripError::UserNotFound(params.user_id));
        }

        // 4. Ledger entry
        sqlx::query(
            r#"
            INSERT INTO transactions (user_id, amount, transaction_type, transaction_description, trip_id)
            VALUES ($1, $2, 'trip', $3, $4)
            "#,
        )
        .bind(params.user_id)
        .bind(fees.total_fee)
        .bind(format!("Trip {}", params.trip_id))
        .bind(params.trip_id)
        .execute(&mut *tx)
        .await?;

        // 5. Bike state from the hardware report
        sqlx::query(
            r#"
            UPDATE bikes
            SET is_available = $2, battery_lvl = $3,
                last_position = ST_GeomFromText($4, 4326), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(params.bike_id)
        .bind(ended.report.is_available && !params.maintenance)
        .bind(ended.report.battery_percent())
        .bind(&ended.report.last_position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            trip_id = trip.id,
            user_id = params.user_id,
            bike_id = params.bike_id,
            total_fee = %fees.total_fee,
            "Trip ended"
        );

        Ok(trip)
    }

    /// Get trip by ID
    pub async fn get_trip(&self, trip_id: i64) -> Result<Trip, TripError> {
        sqlx::query_as::<_, Trip>(&format!("SELECT {} FROM trips WHERE id = $1", TRIP_COLUMNS))
            .bind(trip_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(TripError::TripNotFound(trip_id))
    }

    /// List trips with filters
    pub async fn list_trips(&self, query: &ListTripsQuery) -> Result<Vec<Trip>, TripError> {
        let trips = build_list_query(query)
            .build_query_as::<Trip>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(trips)
    }
}

/// Ownership and open-state checks shared by both end phases
pub(crate) fn check_trip_access(trip: &Trip, user_id: i64, bike_id: i64) -> Result<(), TripError> {
    if trip.user_id != user_id {
        return Err(TripError::UnauthorizedTripAccess(format!(
            "Trip {} does not belong to user {}",
            trip.id, user_id
        )));
    }
    if trip.bike_id != bike_id {
        return Err(TripError::UnauthorizedTripAccess(format!(
            "Trip {} was not made with bike {}",
            trip.id, bike_id
        )));
    }
    if !trip.is_open() {
        return Err(TripError::TripAlreadyEnded(trip.id));
    }
    Ok(())
}

fn build_list_query(query: &ListTripsQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM trips WHERE 1=1", TRIP_COLUMNS));

    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);
    }
    if let Some(bike_id) = query.bike_id {
        builder.push(" AND bike_id = ");
        builder.push_bind(bike_id);
    }
    match query.is_ongoing {
        Some(true) => {
            builder.push(" AND end_time IS NULL");
        }
        Some(false) => {
            builder.push(" AND end_time IS NOT NULL");
        }
        None => {}
    }
    push_time_range(&mut builder, "start_time", query.start_time_gt, query.start_time_lt);
    push_time_range(&mut builder, "end_time", query.end_time_gt, query.end_time_lt);

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
