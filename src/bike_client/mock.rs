//! In-process bike fake

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};

use super::{BikeClientError, BikeEndData, BikeHardware, BikeReport, BikeStartData, EndLog, StartLog};
use geo_types::{LineString, Point};

use crate::models::geometry::ToWkt;

/// How the fake answers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockMode {
    #[default]
    Accept,
    Reject,
    Unavailable,
}

/// Unlocks older than this are forgotten when the next unlock is recorded
const STALE_UNLOCK_AFTER_HOURS: i64 = 24;

/// Fake bike hardware.
///
/// Every bike starts at `start_position` and ends at `end_position`. The fake
/// remembers when each trip was unlocked so the end log carries a matching
/// start time. Unlocks whose trip never got written (the start failed after
/// the bike answered) are pruned once they go stale.
#[derive(Debug)]
pub struct MockBikeClient {
    mode: MockMode,
    battery_lvl: f64,
    start_position: Point<f64>,
    end_position: Point<f64>,
    trip_duration: Option<Duration>,
    started: Mutex<HashMap<i64, DateTime<Utc>>>,
}

impl Default for MockBikeClient {
    fn default() -> Self {
        Self {
            mode: MockMode::Accept,
            battery_lvl: 85.5,
            start_position: Point::new(13.06782, 55.577859),
            end_position: Point::new(13.100047, 55.55034),
            trip_duration: None,
            started: Mutex::new(HashMap::new()),
        }
    }
}

impl MockBikeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: MockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Report every trip as lasting exactly `duration`
    pub fn with_trip_duration(mut self, duration: Duration) -> Self {
        self.trip_duration = Some(duration);
        self
    }

    pub fn with_battery(mut self, battery_lvl: f64) -> Self {
        self.battery_lvl = battery_lvl;
        self
    }

    fn check_mode(&self, bike_id: i64) -> Result<(), BikeClientError> {
        match self.mode {
            MockMode::Accept => Ok(()),
            MockMode::Reject => Err(BikeClientError::Rejected(format!(
                "Bike {} refused the request",
                bike_id
            ))),
            MockMode::Unavailable => Err(BikeClientError::Unavailable(
                "Bike service unreachable".to_string(),
            )),
        }
    }

    fn remember_unlock(&self, trip_id: i64, start_time: DateTime<Utc>) {
        if let Ok(mut started) = self.started.lock() {
            let cutoff = start_time - Duration::hours(STALE_UNLOCK_AFTER_HOURS);
            started.retain(|_, unlocked_at| *unlocked_at > cutoff);
            started.insert(trip_id, start_time);
        }
    }

    fn start_time_of(&self, trip_id: i64) -> Option<DateTime<Utc>> {
        self.started
            .lock()
            .ok()
            .and_then(|mut started| started.remove(&trip_id))
    }
}

/// Timestamps at the database's microsecond precision
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[async_trait]
impl BikeHardware for MockBikeClient {
    async fn authorize_start(
        &self,
        bike_id: i64,
        user_id: i64,
        trip_id: i64,
    ) -> Result<BikeStartData, BikeClientError> {
        self.check_mode(bike_id)?;

        let start_time = now();
        self.remember_unlock(trip_id, start_time);
        tracing::debug!(bike_id, user_id, trip_id, "Mock bike unlocked");

        let position = self.start_position.wkt_string();
        Ok(BikeStartData {
            report: BikeReport {
                battery_lvl: self.battery_lvl,
                last_position: position.clone(),
                is_available: false,
            },
            log: StartLog {
                start_time,
                start_position: position,
            },
        })
    }

    async fn authorize_end(
        &self,
        bike_id: i64,
        user_id: i64,
        trip_id: i64,
        maintenance: bool,
        ignore_zone: bool,
    ) -> Result<BikeEndData, BikeClientError> {
        self.check_mode(bike_id)?;

        let start_time = self.start_time_of(trip_id).unwrap_or_else(now);
        let end_time = match self.trip_duration {
            Some(duration) => start_time + duration,
            None => now().max(start_time),
        };
        tracing::debug!(bike_id, user_id, trip_id, maintenance, ignore_zone, "Mock bike locked");

        let midpoint = Point::new(
            (self.start_position.x() + self.end_position.x()) / 2.0,
            (self.start_position.y() + self.end_position.y()) / 2.0,
        );
        let path = LineString::from(vec![self.start_position, midpoint, self.end_position]);
        let end_position = self.end_position.wkt_string();

        Ok(BikeEndData {
            report: BikeReport {
                battery_lvl: self.battery_lvl,
                last_position: end_position.clone(),
                is_available: !maintenance,
            },
            log: EndLog {
                start_time,
                end_time,
                start_position: self.start_position.wkt_string(),
                end_position,
                path_taken: path.wkt_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_end_log_matches_start() {
        let client = MockBikeClient::new().with_trip_duration(Duration::minutes(30));

        let start = client.authorize_start(1, 2, 3).await.unwrap();
        assert!(!start.report.is_available);
        assert!(start.check_geometry().is_ok());

        let end = client.authorize_end(1, 2, 3, false, false).await.unwrap();
        assert_eq!(end.log.start_time, start.log.start_time);
        assert_eq!(end.log.end_time - end.log.start_time, Duration::minutes(30));
        assert!(end.report.is_available);
        assert!(end.check_geometry().is_ok());
    }

    #[tokio::test]
    async fn test_maintenance_keeps_bike_unavailable() {
        let client = MockBikeClient::new();
        client.authorize_start(1, 2, 3).await.unwrap();
        let end = client.authorize_end(1, 2, 3, true, false).await.unwrap();
        assert!(!end.report.is_available);
    }

    #[tokio::test]
    async fn test_abandoned_unlocks_are_pruned() {
        let client = MockBikeClient::new();
        {
            let mut started = client.started.lock().unwrap();
            started.insert(1, now() - Duration::hours(STALE_UNLOCK_AFTER_HOURS + 1));
            started.insert(2, now() - Duration::hours(1));
        }

        client.authorize_start(7, 2, 3).await.unwrap();

        let started = client.started.lock().unwrap();
        assert!(!started.contains_key(&1));
        assert!(started.contains_key(&2));
        assert!(started.contains_key(&3));
    }

    #[tokio::test]
    async fn test_end_forgets_the_unlock() {
        let client = MockBikeClient::new();
        client.authorize_start(1, 2, 3).await.unwrap();
        client.authorize_end(1, 2, 3, false, false).await.unwrap();
        assert!(client.started.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_path_runs_from_start_to_end() {
        let client = MockBikeClient::new();
        client.authorize_start(1, 2, 3).await.unwrap();
        let end = client.authorize_end(1, 2, 3, false, false).await.unwrap();

        let path = crate::models::geometry::validate_linestring(&end.log.path_taken).unwrap();
        assert_eq!(path.0.len(), 3);
        assert_eq!(Point::from(path.0[0]), client.start_position);
        assert_eq!(Point::from(path.0[2]), client.end_position);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let rejecting = MockBikeClient::new().with_mode(MockMode::Reject);
        assert!(matches!(
            rejecting.authorize_start(1, 2, 3).await,
            Err(BikeClientError::Rejected(_))
        ));

        let down = MockBikeClient::new().with_mode(MockMode::Unavailable);
        assert!(matches!(
            down.authorize_end(1, 2, 3, false, false).await,
            Err(BikeClientError::Unavailable(_))
        ));
    }
}
