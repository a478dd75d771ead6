//! Trip lifecycle against a real PostGIS database
//!
//! Run with `TEST_DATABASE_URL` pointing at a scratch database.

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use chrono::Duration;
    use rust_decimal::Decimal;
    use sqlx::PgPool;
    use uuid::Uuid;

    use bikeshare_server::bike_client::{MockBikeClient, MockMode};
    use bikeshare_server::db::run_migrations;
    use bikeshare_server::error::ApiError;
    use bikeshare_server::trip::{EndTripParams, FeeSchedule, TripError, TripService};
    use bikeshare_server::user::UserService;

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/bikeshare_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(8)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        run_migrations(&pool).await.expect("Failed to migrate");
        pool
    }

    fn schedule() -> FeeSchedule {
        FeeSchedule {
            start_fee: Decimal::new(10, 0),
            minute_rate: Decimal::from_str("0.5").unwrap(),
            end_fee: Decimal::ZERO,
        }
    }

    fn service(pool: &PgPool, bike: MockBikeClient) -> TripService {
        TripService::new(pool.clone(), Arc::new(bike), schedule())
    }

    fn thirty_minute_bike() -> MockBikeClient {
        MockBikeClient::new().with_trip_duration(Duration::minutes(30))
    }

    async fn insert_city(pool: &PgPool) -> i32 {
        sqlx::query_scalar(
            "INSERT INTO cities (city_name, country_code, c_location) \
             VALUES ('Malmö', 'SWE', ST_GeomFromText('POINT(13.0038 55.6050)', 4326)) RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn insert_user(pool: &PgPool, balance: &str, use_prepay: bool) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO users (github_login, balance, use_prepay) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(format!("rider-{}", Uuid::new_v4().simple()))
        .bind(Decimal::from_str(balance).unwrap())
        .bind(use_prepay)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn insert_bike(pool: &PgPool, city_id: i32) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO bikes (battery_lvl, last_position, city_id) \
             VALUES (90, ST_GeomFromText('POINT(13.06782 55.577859)', 4326), $1) RETURNING id",
        )
        .bind(city_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn balance(pool: &PgPool, user_id: i64) -> Decimal {
        sqlx::query_scalar("SELECT balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn trip_transactions(pool: &PgPool, user_id: i64) -> Vec<Decimal> {
        sqlx::query_scalar(
            "SELECT amount FROM transactions WHERE user_id = $1 AND transaction_type = 'trip'",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    async fn open_trips(pool: &PgPool, user_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM trips WHERE user_id = $1 AND end_time IS NULL")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn bike_available(pool: &PgPool, bike_id: i64) -> bool {
        sqlx::query_scalar("SELECT is_available FROM bikes WHERE id = $1")
            .bind(bike_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn trip_count(pool: &PgPool, user_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM trips WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn end_params(trip_id: i64, user_id: i64, bike_id: i64) -> EndTripParams {
        EndTripParams {
            trip_id,
            user_id,
            bike_id,
            maintenance: false,
            ignore_zone: false,
        }
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_thirty_minute_trip_charges_balance() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "100", true).await;
        let bike = insert_bike(&pool, city).await;
        let trips = service(&pool, thirty_minute_bike());

        let trip = trips.start_trip(user, bike).await.unwrap();
        assert!(trip.is_open());

        let ended = trips.end_trip(end_params(trip.id, user, bike)).await.unwrap();

        assert_eq!(ended.total_fee, Some(Decimal::new(25, 0)));
        assert_eq!(ended.time_fee, Some(Decimal::new(15, 0)));
        assert!(ended.path_taken.is_some());
        assert_eq!(balance(&pool, user).await, Decimal::new(75, 0));
        assert_eq!(trip_transactions(&pool, user).await, vec![Decimal::new(25, 0)]);

        let available: bool = sqlx::query_scalar("SELECT is_available FROM bikes WHERE id = $1")
            .bind(bike)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(available);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_ineligible_user_never_starts_trip() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "0", true).await;
        let bike = insert_bike(&pool, city).await;

        let result = service(&pool, thirty_minute_bike()).start_trip(user, bike).await;

        assert!(matches!(result, Err(TripError::UserNotEligible(_))));
        assert_eq!(open_trips(&pool, user).await, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_starts_leave_one_open_trip() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "100", true).await;
        let trips = Arc::new(service(&pool, thirty_minute_bike()));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let bike = insert_bike(&pool, city).await;
            let trips = trips.clone();
            handles.push(tokio::spawn(async move { trips.start_trip(user, bike).await }));
        }

        let mut started = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => started += 1,
                Err(TripError::ActiveTripExists(_)) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(started, 1);
        assert_eq!(open_trips(&pool, user).await, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_ending_twice_changes_nothing() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "100", true).await;
        let bike = insert_bike(&pool, city).await;
        let trips = service(&pool, thirty_minute_bike());

        let trip = trips.start_trip(user, bike).await.unwrap();
        trips.end_trip(end_params(trip.id, user, bike)).await.unwrap();

        let second = trips.end_trip(end_params(trip.id, user, bike)).await;

        assert!(matches!(second, Err(TripError::TripAlreadyEnded(_))));
        assert_eq!(balance(&pool, user).await, Decimal::new(75, 0));
        assert_eq!(trip_transactions(&pool, user).await.len(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_mismatched_user_or_bike_is_rejected() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "100", true).await;
        let other_user = insert_user(&pool, "100", true).await;
        let bike = insert_bike(&pool, city).await;
        let other_bike = insert_bike(&pool, city).await;
        let trips = service(&pool, thirty_minute_bike());

        let trip = trips.start_trip(user, bike).await.unwrap();

        let wrong_user = trips.end_trip(end_params(trip.id, other_user, bike)).await;
        assert!(matches!(wrong_user, Err(TripError::UnauthorizedTripAccess(_))));

        let wrong_bike = trips.end_trip(end_params(trip.id, user, other_bike)).await;
        assert!(matches!(wrong_bike, Err(TripError::UnauthorizedTripAccess(_))));

        assert_eq!(open_trips(&pool, user).await, 1);
        assert_eq!(balance(&pool, user).await, Decimal::new(100, 0));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_rejected_bike_creates_no_trip() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "100", true).await;
        let bike = insert_bike(&pool, city).await;
        let trips = service(&pool, MockBikeClient::new().with_mode(MockMode::Reject));

        let result = trips.start_trip(user, bike).await;

        assert!(matches!(result, Err(TripError::BikeRejected(_))));
        assert_eq!(open_trips(&pool, user).await, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_unreachable_bike_service_creates_no_trip() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "100", true).await;
        let bike = insert_bike(&pool, city).await;
        let trips = service(&pool, MockBikeClient::new().with_mode(MockMode::Unavailable));

        let result = trips.start_trip(user, bike).await;

        assert!(matches!(result, Err(TripError::BikeServiceUnavailable(_))));
        assert_eq!(trip_count(&pool, user).await, 0);
        assert!(bike_available(&pool, bike).await);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_failed_ledger_write_rolls_back_trip_end() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "100", true).await;
        let bike = insert_bike(&pool, city).await;
        let trips = service(&pool, thirty_minute_bike());

        let trip = trips.start_trip(user, bike).await.unwrap();

        // transactions.trip_id is unique, so the ledger insert inside the end
        // transaction fails after the trip row and balance were updated
        sqlx::query(
            "INSERT INTO transactions (user_id, amount, transaction_type, transaction_description, trip_id) \
             VALUES ($1, 1, 'refund', 'occupies trip_id', $2)",
        )
        .bind(user)
        .bind(trip.id)
        .execute(&pool)
        .await
        .unwrap();

        let result = trips.end_trip(end_params(trip.id, user, bike)).await;

        assert!(matches!(result, Err(TripError::Database(_))));
        assert_eq!(open_trips(&pool, user).await, 1);
        assert_eq!(balance(&pool, user).await, Decimal::new(100, 0));
        assert!(trip_transactions(&pool, user).await.is_empty());
        assert!(!bike_available(&pool, bike).await);

        let fees: Option<Decimal> = sqlx::query_scalar("SELECT total_fee FROM trips WHERE id = $1")
            .bind(trip.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(fees, None);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_account_with_open_trip_cannot_be_deleted() {
        let pool = setup_test_db().await;
        let city = insert_city(&pool).await;
        let user = insert_user(&pool, "100", true).await;
        let bike = insert_bike(&pool, city).await;
        let trips = service(&pool, thirty_minute_bike());
        let users = UserService::new(pool.clone());

        let trip = trips.start_trip(user, bike).await.unwrap();

        let refused = users.delete_user(user).await;
        assert!(matches!(refused, Err(ApiError::Conflict(_))));
        assert_eq!(balance(&pool, user).await, Decimal::new(100, 0));

        trips.end_trip(end_params(trip.id, user, bike)).await.unwrap();
        users.delete_user(user).await.unwrap();

        assert!(matches!(users.delete_user(user).await, Err(ApiError::NotFound(_))));
        assert_eq!(balance(&pool, user).await, Decimal::ZERO);
    }
}
